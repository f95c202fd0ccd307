//! Interpretation links, the pipeline's output unit
//!
//! An [`ExtractedLink`] can only be built from a [`LinkDraft`] through
//! [`ExtractedLink::new`], which rejects NaN or out-of-range scores. After
//! construction the only way to change a link is [`ExtractedLink::merged_with`],
//! used by the merge step to fold duplicates together.

use crate::case::ParagraphRef;
use crate::error::LinkError;
use crate::statute::StatuteId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Interpretive stance a paragraph takes toward a provision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpretationType {
    /// Reads the provision restrictively
    Narrow,
    /// Reads the provision expansively
    Broad,
    /// Reads the provision by reference to its purpose
    Purposive,
    /// Explains or applies the provision without narrowing or widening it
    #[default]
    Clarify,
    /// Distinguishes an earlier interpretation on its facts
    Distinguish,
    /// Departs from an earlier interpretation
    Overrule,
}

impl InterpretationType {
    /// Stable lower-case label
    pub fn as_str(&self) -> &'static str {
        match self {
            InterpretationType::Narrow => "narrow",
            InterpretationType::Broad => "broad",
            InterpretationType::Purposive => "purposive",
            InterpretationType::Clarify => "clarify",
            InterpretationType::Distinguish => "distinguish",
            InterpretationType::Overrule => "overrule",
        }
    }
}

impl fmt::Display for InterpretationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterpretationType {
    type Err = String;

    /// Parse a label, accepting common inflections (`narrowed`, `clarifies`)
    ///
    /// `literal`, `explicit` and `applied` readings map to `Clarify`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "narrow" | "narrowed" | "narrowing" | "restrictive" | "strict" => Ok(InterpretationType::Narrow),
            "broad" | "broadened" | "broadening" | "expansive" | "wide" | "liberal" => {
                Ok(InterpretationType::Broad)
            }
            "purposive" | "purpose" => Ok(InterpretationType::Purposive),
            "clarify" | "clarifies" | "clarified" | "clarification" | "literal" | "explicit"
            | "apply" | "applies" | "applied" => Ok(InterpretationType::Clarify),
            "distinguish" | "distinguishes" | "distinguished" => Ok(InterpretationType::Distinguish),
            "overrule" | "overrules" | "overruled" | "overruling" => Ok(InterpretationType::Overrule),
            other => Err(format!("unknown interpretation type: {}", other)),
        }
    }
}

/// Legal weight of an interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Authority {
    /// Ratio of an apex or appellate court
    Binding,
    /// Ratio of a first-instance court
    Persuasive,
    /// Remarks made in passing
    Obiter,
    /// Minority or dissenting opinion
    Dissenting,
}

impl Authority {
    /// Stable lower-case label
    pub fn as_str(&self) -> &'static str {
        match self {
            Authority::Binding => "binding",
            Authority::Persuasive => "persuasive",
            Authority::Obiter => "obiter",
            Authority::Dissenting => "dissenting",
        }
    }

    /// Retrieval boost applied to links of this authority
    pub fn default_boost(&self) -> f64 {
        match self {
            Authority::Binding => 0.95,
            Authority::Persuasive => 0.65,
            Authority::Obiter => 0.5,
            Authority::Dissenting => 0.4,
        }
    }
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance of a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMethod {
    /// Produced by the pattern-based extractor
    RuleBased,
    /// Produced by the language-model extractor
    LlmAssisted,
    /// Both extractors produced the link
    Merged,
}

impl ExtractionMethod {
    /// Stable kebab-case label
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::RuleBased => "rule-based",
            ExtractionMethod::LlmAssisted => "llm-assisted",
            ExtractionMethod::Merged => "merged",
        }
    }

    /// Precedence when two links share a key; higher wins
    ///
    /// Rule-based output is trusted over model output. A merged link already
    /// carries rule-based scalars, so it ranks with rule-based.
    pub fn priority(&self) -> u8 {
        match self {
            ExtractionMethod::RuleBased | ExtractionMethod::Merged => 2,
            ExtractionMethod::LlmAssisted => 1,
        }
    }

    fn has_rule_source(&self) -> bool {
        matches!(self, ExtractionMethod::RuleBased | ExtractionMethod::Merged)
    }

    fn has_llm_source(&self) -> bool {
        matches!(self, ExtractionMethod::LlmAssisted | ExtractionMethod::Merged)
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a link: `(statute_id, case_id, paragraph_number)`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LinkKey {
    /// Normalized statute identifier
    pub statute_id: StatuteId,
    /// Case identifier
    pub case_id: String,
    /// Paragraph number
    pub paragraph_number: u32,
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}#{}", self.statute_id, self.case_id, self.paragraph_number)
    }
}

/// Plain record an extractor fills in before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkDraft {
    /// Normalized statute identifier
    pub statute_id: StatuteId,
    /// Source paragraph
    #[serde(flatten)]
    pub paragraph: ParagraphRef,
    /// Interpretive stance
    pub interpretation_type: InterpretationType,
    /// Legal weight
    pub authority: Authority,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Retrieval boost in [0, 1]
    pub boost_factor: f64,
    /// Provenance
    pub method: ExtractionMethod,
    /// Holding statement, if one was found
    #[serde(default)]
    pub holding: Option<String>,
    /// Fact-pattern labels
    #[serde(default)]
    pub fact_pattern_tags: Vec<String>,
}

impl LinkDraft {
    /// Clamp finite confidence and boost into [0, 1]
    ///
    /// NaN is left untouched so that [`ExtractedLink::new`] still rejects it.
    pub fn clamped(mut self) -> Self {
        if !self.confidence.is_nan() {
            self.confidence = clamp_unit(self.confidence);
        }
        if !self.boost_factor.is_nan() {
            self.boost_factor = clamp_unit(self.boost_factor);
        }
        self
    }
}

/// Scored association between a statute provision and a case paragraph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LinkDraft")]
pub struct ExtractedLink {
    statute_id: StatuteId,
    #[serde(flatten)]
    paragraph: ParagraphRef,
    interpretation_type: InterpretationType,
    authority: Authority,
    confidence: f64,
    boost_factor: f64,
    method: ExtractionMethod,
    holding: Option<String>,
    fact_pattern_tags: BTreeSet<String>,
}

impl ExtractedLink {
    /// Validate a draft and build a link
    ///
    /// Rejects NaN or out-of-range confidence and boost, and an empty case id.
    /// Blank holdings become `None`; tags are trimmed, lower-cased and
    /// deduplicated.
    pub fn new(draft: LinkDraft) -> Result<Self, LinkError> {
        if !(0.0..=1.0).contains(&draft.confidence) {
            return Err(LinkError::ConfidenceOutOfRange(draft.confidence));
        }
        if !(0.0..=1.0).contains(&draft.boost_factor) {
            return Err(LinkError::BoostOutOfRange(draft.boost_factor));
        }
        if draft.paragraph.case_id.trim().is_empty() {
            return Err(LinkError::EmptyCaseId);
        }

        let holding = draft
            .holding
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty());

        Ok(Self {
            statute_id: draft.statute_id,
            paragraph: draft.paragraph,
            interpretation_type: draft.interpretation_type,
            authority: draft.authority,
            confidence: draft.confidence,
            boost_factor: draft.boost_factor,
            method: draft.method,
            holding,
            fact_pattern_tags: normalize_tags(&draft.fact_pattern_tags),
        })
    }

    /// Dedup key of this link
    pub fn key(&self) -> LinkKey {
        LinkKey {
            statute_id: self.statute_id.clone(),
            case_id: self.paragraph.case_id.clone(),
            paragraph_number: self.paragraph.paragraph_number,
        }
    }

    /// Statute identifier
    pub fn statute_id(&self) -> &StatuteId {
        &self.statute_id
    }

    /// Source paragraph
    pub fn paragraph(&self) -> &ParagraphRef {
        &self.paragraph
    }

    /// Interpretive stance
    pub fn interpretation_type(&self) -> InterpretationType {
        self.interpretation_type
    }

    /// Legal weight
    pub fn authority(&self) -> Authority {
        self.authority
    }

    /// Confidence in [0, 1]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Retrieval boost in [0, 1]
    pub fn boost_factor(&self) -> f64 {
        self.boost_factor
    }

    /// Provenance
    pub fn method(&self) -> ExtractionMethod {
        self.method
    }

    /// Holding statement, if any
    pub fn holding(&self) -> Option<&str> {
        self.holding.as_deref()
    }

    /// Fact-pattern labels, sorted
    pub fn fact_pattern_tags(&self) -> &BTreeSet<String> {
        &self.fact_pattern_tags
    }

    /// Fold a duplicate into this link
    ///
    /// Scalar fields (interpretation, authority, confidence, boost, holding)
    /// come from `self`; fact-pattern tags are the union of both. The method
    /// becomes `Merged` once both a rule-based and a model source are
    /// present, otherwise it stays as it was. The caller is responsible for
    /// only merging links that share a [`LinkKey`].
    pub fn merged_with(mut self, other: &ExtractedLink) -> Self {
        debug_assert_eq!(self.key(), other.key(), "merging links with different keys");
        let rule = self.method.has_rule_source() || other.method.has_rule_source();
        let llm = self.method.has_llm_source() || other.method.has_llm_source();
        if rule && llm {
            self.method = ExtractionMethod::Merged;
        }
        self.fact_pattern_tags
            .extend(other.fact_pattern_tags.iter().cloned());
        self
    }

    /// Whether any of the given fact-pattern tags is carried by this link
    pub fn matches_fact_pattern<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        normalize_tags(tags)
            .iter()
            .any(|tag| self.fact_pattern_tags.contains(tag))
    }

    /// Jaccard overlap between this link's tags and the given tags
    ///
    /// Returns 0.0 when either side has no tags.
    pub fn fact_overlap_score<S: AsRef<str>>(&self, tags: &[S]) -> f64 {
        let query = normalize_tags(tags);
        if query.is_empty() || self.fact_pattern_tags.is_empty() {
            return 0.0;
        }
        let intersection = query.intersection(&self.fact_pattern_tags).count();
        let union = query.union(&self.fact_pattern_tags).count();
        intersection as f64 / union as f64
    }

    /// Boost to apply at retrieval time: `boost_factor × applicability`
    ///
    /// Applicability is clamped into [0, 1]; NaN counts as zero.
    pub fn effective_boost(&self, applicability: f64) -> f64 {
        let applicability = if applicability.is_nan() {
            0.0
        } else {
            clamp_unit(applicability)
        };
        clamp_unit(self.boost_factor * applicability)
    }
}

impl TryFrom<LinkDraft> for ExtractedLink {
    type Error = LinkError;

    fn try_from(draft: LinkDraft) -> Result<Self, Self::Error> {
        Self::new(draft)
    }
}

impl From<ExtractedLink> for LinkDraft {
    fn from(link: ExtractedLink) -> Self {
        LinkDraft {
            statute_id: link.statute_id,
            paragraph: link.paragraph,
            interpretation_type: link.interpretation_type,
            authority: link.authority,
            confidence: link.confidence,
            boost_factor: link.boost_factor,
            method: link.method,
            holding: link.holding,
            fact_pattern_tags: link.fact_pattern_tags.into_iter().collect(),
        }
    }
}

fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> BTreeSet<String> {
    tags.iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(method: ExtractionMethod, confidence: f64, tags: &[&str]) -> LinkDraft {
        LinkDraft {
            statute_id: StatuteId::new("Defamation Act", "7").unwrap(),
            paragraph: ParagraphRef::new("lim-v-sph", 12),
            interpretation_type: InterpretationType::Narrow,
            authority: Authority::Binding,
            confidence,
            boost_factor: 0.95,
            method,
            holding: Some("s 7 requires positive public benefit".to_string()),
            fact_pattern_tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_new_rejects_out_of_range_scores() {
        let mut d = draft(ExtractionMethod::RuleBased, 1.2, &[]);
        assert_eq!(ExtractedLink::new(d.clone()), Err(LinkError::ConfidenceOutOfRange(1.2)));

        d.confidence = f64::NAN;
        assert!(matches!(ExtractedLink::new(d.clone()), Err(LinkError::ConfidenceOutOfRange(_))));

        d.confidence = 0.9;
        d.boost_factor = -0.1;
        assert_eq!(ExtractedLink::new(d), Err(LinkError::BoostOutOfRange(-0.1)));
    }

    #[test]
    fn test_new_rejects_empty_case_id() {
        let mut d = draft(ExtractionMethod::RuleBased, 0.9, &[]);
        d.paragraph.case_id = "  ".to_string();
        assert_eq!(ExtractedLink::new(d), Err(LinkError::EmptyCaseId));
    }

    #[test]
    fn test_clamped_draft_is_accepted() {
        let mut d = draft(ExtractionMethod::LlmAssisted, 1.7, &[]);
        d.boost_factor = f64::INFINITY;
        let link = ExtractedLink::new(d.clamped()).unwrap();
        assert_eq!(link.confidence(), 1.0);
        assert_eq!(link.boost_factor(), 1.0);
    }

    #[test]
    fn test_blank_holding_becomes_none() {
        let mut d = draft(ExtractionMethod::RuleBased, 0.9, &[]);
        d.holding = Some("   ".to_string());
        assert_eq!(ExtractedLink::new(d).unwrap().holding(), None);
    }

    #[test]
    fn test_tags_are_normalized() {
        let link = ExtractedLink::new(draft(
            ExtractionMethod::RuleBased,
            0.9,
            &[" Defamation ", "media", "MEDIA", ""],
        ))
        .unwrap();
        let tags: Vec<&str> = link.fact_pattern_tags().iter().map(String::as_str).collect();
        assert_eq!(tags, vec!["defamation", "media"]);
    }

    #[test]
    fn test_merge_rule_and_llm_becomes_merged() {
        let rule = ExtractedLink::new(draft(ExtractionMethod::RuleBased, 0.9, &["media"])).unwrap();
        let mut llm_draft = draft(ExtractionMethod::LlmAssisted, 0.7, &["public interest"]);
        llm_draft.interpretation_type = InterpretationType::Broad;
        let llm = ExtractedLink::new(llm_draft).unwrap();

        let merged = rule.clone().merged_with(&llm);
        assert_eq!(merged.method(), ExtractionMethod::Merged);
        assert_eq!(merged.confidence(), rule.confidence());
        assert_eq!(merged.interpretation_type(), InterpretationType::Narrow);
        assert_eq!(merged.fact_pattern_tags().len(), 2);
    }

    #[test]
    fn test_merge_same_source_keeps_method() {
        let a = ExtractedLink::new(draft(ExtractionMethod::RuleBased, 0.9, &["a"])).unwrap();
        let b = ExtractedLink::new(draft(ExtractionMethod::RuleBased, 0.85, &["b"])).unwrap();
        let merged = a.merged_with(&b);
        assert_eq!(merged.method(), ExtractionMethod::RuleBased);
        assert_eq!(merged.confidence(), 0.9);
    }

    #[test]
    fn test_fact_pattern_helpers() {
        let link = ExtractedLink::new(draft(
            ExtractionMethod::RuleBased,
            0.9,
            &["defamation", "media", "public interest"],
        ))
        .unwrap();
        assert!(link.matches_fact_pattern(&["Media"]));
        assert!(!link.matches_fact_pattern(&["contract"]));
        assert!(!link.matches_fact_pattern::<&str>(&[]));

        // {media, contract} vs {defamation, media, public interest}: 1 / 4
        assert_eq!(link.fact_overlap_score(&["media", "contract"]), 0.25);
        assert_eq!(link.fact_overlap_score::<&str>(&[]), 0.0);
    }

    #[test]
    fn test_effective_boost() {
        let link = ExtractedLink::new(draft(ExtractionMethod::RuleBased, 0.9, &[])).unwrap();
        assert!((link.effective_boost(0.5) - 0.475).abs() < 1e-9);
        assert_eq!(link.effective_boost(2.0), 0.95);
        assert_eq!(link.effective_boost(f64::NAN), 0.0);
    }

    #[test]
    fn test_interpretation_labels() {
        assert_eq!("narrowed".parse::<InterpretationType>(), Ok(InterpretationType::Narrow));
        assert_eq!("Literal".parse::<InterpretationType>(), Ok(InterpretationType::Clarify));
        assert_eq!("overruled".parse::<InterpretationType>(), Ok(InterpretationType::Overrule));
        assert!("sideways".parse::<InterpretationType>().is_err());
    }

    #[test]
    fn test_serde_shape() {
        let link = ExtractedLink::new(draft(ExtractionMethod::LlmAssisted, 0.7, &["media"])).unwrap();
        let value = serde_json::to_value(&link).unwrap();
        assert_eq!(value["statute_id"], "Defamation Act§7");
        assert_eq!(value["case_id"], "lim-v-sph");
        assert_eq!(value["paragraph_number"], 12);
        assert_eq!(value["method"], "llm-assisted");
        assert_eq!(value["authority"], "binding");

        let back: ExtractedLink = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(back, link);

        let mut bad = value;
        bad["confidence"] = serde_json::json!(3.0);
        assert!(serde_json::from_value::<ExtractedLink>(bad).is_err());
    }
}
