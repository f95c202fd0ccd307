//! Link validation logic

use crate::config::CheckWeights;
use crate::ValidationConfig;
use lexlink_domain::statute::normalize_section;
use lexlink_domain::{
    Authority, CaseParagraphInput, ExtractedLink, ExtractionMethod, ParagraphIndex, ParagraphRole,
};
use lexlink_extractor::{AuthorityDeterminer, CitationExtractor, StatuteIdMapper};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

/// Score given to a check that needs the source paragraph when it is missing
const UNAVAILABLE_SCORE: f64 = 0.5;

/// Words suggesting the court is construing, not just citing
const INTERPRETATION_KEYWORDS: &[&str] = &[
    "held", "construed", "interpreted", "means", "applies", "requires", "narrow", "broad",
    "purposive", "clarify", "scope", "extent", "meaning", "purpose",
];

/// Paragraphs that are only a cross-reference or citation marker
static RED_FLAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:[\[\]\d\s]+$|see\s+also\b|cf\.)").expect("red flag pattern is valid")
});

/// Section references (`s 7`, `section 2(1)`, `§ 3A`)
static SECTION_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\b(?:sections?|secs?\.?|ss?\.?)|§)\s*(?P<section>\d+[a-z]{0,2})\b")
        .expect("section reference pattern is valid")
});

/// One quality check
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    /// The statute is cited in the source paragraph
    StatuteMentioned,
    /// Confidence and boost are in range
    ConfidenceInRange,
    /// Authority agrees with the court and paragraph role
    AuthorityConsistency,
    /// Rule-based links carry a holding
    HoldingPresence,
    /// The paragraph reads like an interpretation
    TextAlignment,
}

impl Check {
    /// Every check, in evaluation order
    pub const ALL: [Check; 5] = [
        Check::StatuteMentioned,
        Check::ConfidenceInRange,
        Check::AuthorityConsistency,
        Check::HoldingPresence,
        Check::TextAlignment,
    ];

    /// Stable snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Check::StatuteMentioned => "statute_mentioned",
            Check::ConfidenceInRange => "confidence_in_range",
            Check::AuthorityConsistency => "authority_consistency",
            Check::HoldingPresence => "holding_presence",
            Check::TextAlignment => "text_alignment",
        }
    }

    /// Weight of this check
    pub fn weight(&self, weights: &CheckWeights) -> f64 {
        match self {
            Check::StatuteMentioned => weights.statute_mentioned,
            Check::ConfidenceInRange => weights.confidence_in_range,
            Check::AuthorityConsistency => weights.authority_consistency,
            Check::HoldingPresence => weights.holding_presence,
            Check::TextAlignment => weights.text_alignment,
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Which check
    pub check: Check,
    /// Sub-score in [0, 1]
    pub score: f64,
    /// Full marks
    pub passed: bool,
    /// Human-readable explanation
    pub detail: String,
}

impl CheckResult {
    fn new(check: Check, score: f64, detail: impl Into<String>) -> Self {
        Self {
            check,
            score,
            passed: score >= 1.0,
            detail: detail.into(),
        }
    }

    fn unavailable(check: Check) -> Self {
        Self::new(check, UNAVAILABLE_SCORE, "source paragraph unavailable")
    }
}

/// Per-check breakdown, aggregate and verdict for one link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationScore {
    /// Results in evaluation order
    pub checks: Vec<CheckResult>,
    /// Weighted mean of the sub-scores
    pub aggregate: f64,
    /// Whether the statute is fully cited and the aggregate meets the threshold
    pub passed: bool,
}

impl ValidationScore {
    /// Result of a given check
    pub fn check(&self, check: Check) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.check == check)
    }

    /// Checks without full marks
    pub fn failed_checks(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

/// A link annotated with its validation score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedLink {
    /// The link, unchanged
    #[serde(flatten)]
    pub link: ExtractedLink,
    /// Its validation
    pub validation: ValidationScore,
}

/// Scores links on independent checks and applies the pass threshold
#[derive(Debug, Clone)]
pub struct QualityValidator {
    config: ValidationConfig,
    citations: CitationExtractor,
    mapper: StatuteIdMapper,
    authority: AuthorityDeterminer,
}

impl QualityValidator {
    /// Create a new validator with the given configuration
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            config,
            citations: CitationExtractor::new(),
            mapper: StatuteIdMapper::new(),
            authority: AuthorityDeterminer::new(),
        }
    }

    /// Create a validator with default configuration
    pub fn default_config() -> Self {
        Self::new(ValidationConfig::default())
    }

    /// Use a custom statute mapper for the mention check
    pub fn with_mapper(mut self, mapper: StatuteIdMapper) -> Self {
        self.mapper = mapper;
        self
    }

    /// Configuration in use
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a link against its source paragraph
    ///
    /// Never fails. Checks that need the paragraph score 0.5 when `source`
    /// is `None`. A link whose statute is not fully cited in the paragraph
    /// fails regardless of its aggregate.
    pub fn validate(&self, link: &ExtractedLink, source: Option<&CaseParagraphInput>) -> ValidationScore {
        let checks = vec![
            self.check_statute_mentioned(link, source),
            self.check_confidence_in_range(link),
            self.check_authority_consistency(link, source),
            self.check_holding_presence(link),
            self.check_text_alignment(source),
        ];

        let weights = &self.config.weights;
        let total = weights.total();
        let aggregate = if total > 0.0 {
            checks.iter().map(|c| c.check.weight(weights) * c.score).sum::<f64>() / total
        } else {
            0.0
        };
        let mentioned = checks
            .iter()
            .any(|c| c.check == Check::StatuteMentioned && c.passed);
        let passed = mentioned && aggregate >= self.config.threshold;

        debug!(link = %link.key(), aggregate, mentioned, passed, "Validated link");
        ValidationScore {
            checks,
            aggregate,
            passed,
        }
    }

    /// Validate every link, looking up source paragraphs in `paragraphs`
    ///
    /// Failing links are kept in the output with their score.
    pub fn validate_batch(
        &self,
        links: impl IntoIterator<Item = ExtractedLink>,
        paragraphs: &ParagraphIndex<'_>,
    ) -> Vec<ValidatedLink> {
        links
            .into_iter()
            .map(|link| {
                let validation = self.validate(&link, paragraphs.get(link.paragraph()));
                ValidatedLink { link, validation }
            })
            .collect()
    }

    /// Return only links that pass validation
    pub fn filter_passing(
        &self,
        links: impl IntoIterator<Item = ExtractedLink>,
        paragraphs: &ParagraphIndex<'_>,
    ) -> Vec<ExtractedLink> {
        self.validate_batch(links, paragraphs)
            .into_iter()
            .filter(|v| v.validation.passed)
            .map(|v| v.link)
            .collect()
    }

    /// Statute name and section both appear in the paragraph
    fn check_statute_mentioned(&self, link: &ExtractedLink, source: Option<&CaseParagraphInput>) -> CheckResult {
        let Some(source) = source else {
            return CheckResult::unavailable(Check::StatuteMentioned);
        };
        let text = source.text();
        let statute = link.statute_id();
        let citations = self.citations.extract(text);

        let name_found = text.to_lowercase().contains(&statute.name().to_lowercase())
            || citations
                .iter()
                .any(|c| self.mapper.canonical_name(&c.name).eq_ignore_ascii_case(statute.name()));

        let section_found = SECTION_REF_RE.captures_iter(text).any(|caps| {
            caps.name("section")
                .and_then(|m| normalize_section(m.as_str()))
                .is_some_and(|s| s.eq_ignore_ascii_case(statute.section()))
        });

        match (name_found, section_found) {
            (true, true) => CheckResult::new(Check::StatuteMentioned, 1.0, format!("{} found in text", statute)),
            (true, false) => CheckResult::new(
                Check::StatuteMentioned,
                0.5,
                format!("'{}' found but not section {}", statute.name(), statute.section()),
            ),
            (false, true) => CheckResult::new(
                Check::StatuteMentioned,
                0.5,
                format!("section {} found but not '{}'", statute.section(), statute.name()),
            ),
            (false, false) => CheckResult::new(Check::StatuteMentioned, 0.0, "Statute not found in case text"),
        }
    }

    fn check_confidence_in_range(&self, link: &ExtractedLink) -> CheckResult {
        let confidence = link.confidence();
        let boost = link.boost_factor();
        let unit = 0.0..=1.0;
        if !unit.contains(&confidence) || !unit.contains(&boost) {
            return CheckResult::new(
                Check::ConfidenceInRange,
                0.0,
                format!("confidence {} or boost {} outside [0, 1]", confidence, boost),
            );
        }
        if confidence < self.config.min_confidence {
            return CheckResult::new(
                Check::ConfidenceInRange,
                0.5,
                format!("Confidence: {:.2} (min: {:.2})", confidence, self.config.min_confidence),
            );
        }
        CheckResult::new(
            Check::ConfidenceInRange,
            1.0,
            format!("Confidence: {:.2}, boost: {:.2}", confidence, boost),
        )
    }

    /// Compare the label with what the court level and role imply
    ///
    /// A binding label on a first-instance court, or a persuasive label on
    /// an appellate majority, is a hard inconsistency. Other disagreements
    /// concern the obiter and dissent heuristics and earn half marks.
    fn check_authority_consistency(&self, link: &ExtractedLink, source: Option<&CaseParagraphInput>) -> CheckResult {
        let Some(source) = source else {
            return CheckResult::unavailable(Check::AuthorityConsistency);
        };
        let metadata = source.metadata();
        let expected = self.authority.determine(metadata, source.text());
        let actual = link.authority();
        let appellate = metadata.court_level().is_binding();

        if actual == expected {
            return CheckResult::new(
                Check::AuthorityConsistency,
                1.0,
                format!("{} with {} authority is appropriate", metadata.court, actual.as_str()),
            );
        }

        let role = self.authority.effective_role(metadata, source.text());
        let hard = match actual {
            Authority::Binding => !appellate,
            Authority::Persuasive => appellate && role == ParagraphRole::Majority,
            Authority::Obiter | Authority::Dissenting => false,
        };
        let score = if hard { 0.0 } else { 0.5 };
        CheckResult::new(
            Check::AuthorityConsistency,
            score,
            format!(
                "{} with {} authority is inconsistent (expected {})",
                metadata.court,
                actual.as_str(),
                expected.as_str()
            ),
        )
    }

    fn check_holding_presence(&self, link: &ExtractedLink) -> CheckResult {
        let holding = link.holding().unwrap_or("").trim();
        if link.method() == ExtractionMethod::LlmAssisted {
            return CheckResult::new(Check::HoldingPresence, 1.0, "Holding not required for llm-assisted links");
        }
        let chars = holding.chars().count();
        if chars == 0 {
            CheckResult::new(Check::HoldingPresence, 0.0, "No holding extracted")
        } else if chars < self.config.min_holding_chars || holding == "..." {
            CheckResult::new(
                Check::HoldingPresence,
                0.5,
                format!("Holding too short: {} chars (min: {})", chars, self.config.min_holding_chars),
            )
        } else {
            CheckResult::new(Check::HoldingPresence, 1.0, format!("Holding present ({} chars)", chars))
        }
    }

    /// Length, interpretation keywords and red-flag patterns
    fn check_text_alignment(&self, source: Option<&CaseParagraphInput>) -> CheckResult {
        let Some(source) = source else {
            return CheckResult::unavailable(Check::TextAlignment);
        };
        let text = source.text().trim();
        if RED_FLAG_RE.is_match(text) {
            return CheckResult::new(Check::TextAlignment, 0.0, "Red flag pattern matched");
        }

        let length = text.chars().count();
        let long_enough = length >= self.config.min_text_chars;
        let lower = text.to_lowercase();
        let found: Vec<&str> = INTERPRETATION_KEYWORDS
            .iter()
            .copied()
            .filter(|kw| lower.contains(kw))
            .collect();

        let score = (u8::from(long_enough) + u8::from(!found.is_empty())) as f64 / 2.0;
        let keywords = if found.is_empty() {
            "no interpretation keywords".to_string()
        } else {
            format!("keywords: {}", found.join(", "))
        };
        CheckResult::new(
            Check::TextAlignment,
            score,
            format!("Text length: {} chars (min: {}); {}", length, self.config.min_text_chars, keywords),
        )
    }
}

impl Default for QualityValidator {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexlink_domain::{CaseMetadata, InterpretationType, LinkDraft, ParagraphRef, StatuteId};
    use proptest::prelude::*;

    const LIM: &str = "In Lim v SPH [2015] SGCA 33, the Court of Appeal held that s.7 of the \
                       Defamation Act requires proof of positive public benefit, narrowing the \
                       prior broad reading.";

    fn source(text: &str, court: &str) -> CaseParagraphInput {
        CaseParagraphInput::new("lim-v-sph", 33, text, CaseMetadata::new(court))
    }

    fn link(statute: &str, authority: Authority, method: ExtractionMethod, holding: Option<&str>) -> ExtractedLink {
        ExtractedLink::new(LinkDraft {
            statute_id: StatuteId::parse(statute).unwrap(),
            paragraph: ParagraphRef::new("lim-v-sph", 33),
            interpretation_type: InterpretationType::Narrow,
            authority,
            confidence: 0.85,
            boost_factor: authority.default_boost(),
            method,
            holding: holding.map(str::to_string),
            fact_pattern_tags: Vec::new(),
        })
        .unwrap()
    }

    fn good_link() -> ExtractedLink {
        link("Defamation Act§7", Authority::Binding, ExtractionMethod::RuleBased, Some(LIM))
    }

    #[test]
    fn test_good_link_passes_all_checks() {
        let score = QualityValidator::default().validate(&good_link(), Some(&source(LIM, "SGCA")));
        assert!(score.passed);
        assert!((score.aggregate - 1.0).abs() < 1e-9);
        assert_eq!(score.failed_checks().count(), 0);
    }

    #[test]
    fn test_statute_not_in_text_fails() {
        let l = link("Evidence Act§32", Authority::Binding, ExtractionMethod::RuleBased, Some(LIM));
        let score = QualityValidator::default().validate(&l, Some(&source(LIM, "SGCA")));
        let check = score.check(Check::StatuteMentioned).unwrap();
        assert_eq!(check.score, 0.0);
        assert!(!check.passed);
        assert!(!score.passed);
    }

    #[test]
    fn test_statute_found_through_abbreviation() {
        let text = "We hold that s 9 of the CLA applies to contracts made before the \
                    amendment came into force.";
        let l = link("Civil Law Act§9", Authority::Binding, ExtractionMethod::RuleBased, Some(text));
        let score = QualityValidator::default().validate(&l, Some(&source(text, "SGCA")));
        assert!(score.check(Check::StatuteMentioned).unwrap().passed);
    }

    #[test]
    fn test_wrong_section_gets_half_marks() {
        let l = link("Defamation Act§8", Authority::Binding, ExtractionMethod::RuleBased, Some(LIM));
        let score = QualityValidator::default().validate(&l, Some(&source(LIM, "SGCA")));
        assert_eq!(score.check(Check::StatuteMentioned).unwrap().score, 0.5);
        assert!(!score.passed);
    }

    #[test]
    fn test_partial_mention_blocks_otherwise_perfect_link() {
        let paragraphs = vec![source(LIM, "SGCA")];
        let index = ParagraphIndex::new(&paragraphs);
        let validator = QualityValidator::new(ValidationConfig::lenient());

        for statute in ["Defamation Act§99", "Penal Code§7"] {
            let l = link(statute, Authority::Binding, ExtractionMethod::RuleBased, Some(LIM));
            let score = validator.validate(&l, Some(&paragraphs[0]));
            let mention = score.check(Check::StatuteMentioned).unwrap();
            assert_eq!(mention.score, 0.5, "{}", statute);
            // Every other check has full marks
            assert_eq!(score.failed_checks().count(), 1, "{}", statute);
            assert!(score.aggregate > validator.config().threshold, "{}", statute);
            assert!(!score.passed, "{}", statute);

            assert!(validator.filter_passing(vec![l], &index).is_empty(), "{}", statute);
        }
    }

    #[test]
    fn test_binding_on_first_instance_is_inconsistent() {
        let score = QualityValidator::default().validate(&good_link(), Some(&source(LIM, "SGHC")));
        let check = score.check(Check::AuthorityConsistency).unwrap();
        assert_eq!(check.score, 0.0);
        assert!(check.detail.contains("inconsistent"));
    }

    #[test]
    fn test_obiter_disagreement_is_soft() {
        let l = link("Defamation Act§7", Authority::Obiter, ExtractionMethod::LlmAssisted, None);
        let score = QualityValidator::default().validate(&l, Some(&source(LIM, "SGCA")));
        assert_eq!(score.check(Check::AuthorityConsistency).unwrap().score, 0.5);
    }

    #[test]
    fn test_missing_holding_on_rule_link() {
        let l = link("Defamation Act§7", Authority::Binding, ExtractionMethod::RuleBased, None);
        let score = QualityValidator::default().validate(&l, Some(&source(LIM, "SGCA")));
        assert_eq!(score.check(Check::HoldingPresence).unwrap().score, 0.0);
        // A defect signal, not fatal
        assert!(score.passed);

        let l = link("Defamation Act§7", Authority::Binding, ExtractionMethod::LlmAssisted, None);
        let score = QualityValidator::default().validate(&l, Some(&source(LIM, "SGCA")));
        assert!(score.check(Check::HoldingPresence).unwrap().passed);
    }

    #[test]
    fn test_low_confidence_half_marks() {
        let mut draft = LinkDraft::from(good_link());
        draft.confidence = 0.4;
        let l = ExtractedLink::new(draft).unwrap();
        let score = QualityValidator::default().validate(&l, Some(&source(LIM, "SGCA")));
        assert_eq!(score.check(Check::ConfidenceInRange).unwrap().score, 0.5);
    }

    #[test]
    fn test_red_flags_and_short_text() {
        let validator = QualityValidator::default();
        for text in ["[5]", "See also s 7 of the Defamation Act.", "cf. Tan v Lim"] {
            let score = validator.validate(&good_link(), Some(&source(text, "SGCA")));
            assert_eq!(score.check(Check::TextAlignment).unwrap().score, 0.0, "{}", text);
        }

        let score = validator.validate(&good_link(), Some(&source("Section 7 is narrow.", "SGCA")));
        assert_eq!(score.check(Check::TextAlignment).unwrap().score, 0.5);
    }

    #[test]
    fn test_missing_source_scores_half() {
        let score = QualityValidator::default().validate(&good_link(), None);
        for check in [Check::StatuteMentioned, Check::AuthorityConsistency, Check::TextAlignment] {
            let result = score.check(check).unwrap();
            assert_eq!(result.score, 0.5);
            assert!(result.detail.contains("unavailable"));
        }
        assert!(!score.passed);
    }

    #[test]
    fn test_filter_passing_matches_batch() {
        let paragraphs = vec![source(LIM, "SGCA")];
        let index = ParagraphIndex::new(&paragraphs);
        let links = vec![
            good_link(),
            link("Evidence Act§32", Authority::Binding, ExtractionMethod::RuleBased, None),
        ];
        let validator = QualityValidator::default();

        let validated = validator.validate_batch(links.clone(), &index);
        assert_eq!(validated.len(), 2);
        let passing = validator.filter_passing(links, &index);
        assert_eq!(passing, vec![good_link()]);
        assert_eq!(
            validated.iter().filter(|v| v.validation.passed).count(),
            passing.len()
        );
    }

    #[test]
    fn test_threshold_configurable() {
        let l = link("Defamation Act§7", Authority::Binding, ExtractionMethod::RuleBased, None);
        let config = ValidationConfig {
            threshold: 0.95,
            ..Default::default()
        };
        let score = QualityValidator::new(config).validate(&l, Some(&source(LIM, "SGCA")));
        assert!(!score.passed);
    }

    proptest! {
        #[test]
        fn prop_aggregate_in_unit_range(confidence in 0.0f64..=1.0, boost in 0.0f64..=1.0, text in ".{0,200}") {
            let mut draft = LinkDraft::from(good_link());
            draft.confidence = confidence;
            draft.boost_factor = boost;
            let l = ExtractedLink::new(draft).unwrap();
            let score = QualityValidator::default().validate(&l, Some(&source(&text, "SGHC")));
            prop_assert!((0.0..=1.0 + 1e-9).contains(&score.aggregate));
            prop_assert_eq!(score.checks.len(), Check::ALL.len());
        }
    }
}
