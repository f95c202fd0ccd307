//! Authority determination
//!
//! Decision order:
//!
//! 1. dissent (flagged by metadata or detected in the text) → `Dissenting`,
//!    whatever the court
//! 2. obiter (flagged or detected) → `Obiter`
//! 3. otherwise the court level decides: appellate → `Binding`,
//!    first instance → `Persuasive`
//!
//! Detection of dissent and obiter from the text is a best-effort lexical
//! heuristic. It misses paragraphs that do not use the usual markers.

use lexlink_domain::{Authority, CaseMetadata, ParagraphRole};
use regex::Regex;
use std::sync::LazyLock;

static DISSENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:in dissent|i dissent|dissenting (?:judgment|opinion|view)|minority (?:judgment|opinion)|i would (?:respectfully )?disagree|i would have (?:allowed|dismissed) the appeal|with (?:the greatest )?respect,? i (?:cannot agree|disagree))\b",
    )
    .expect("dissent pattern is valid")
});

static OBITER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:obiter(?: dict(?:um|a))?|by the way|in passing|(?:un)?necessary (?:for (?:me|us) )?to decide|need not (?:finally )?decide|if it (?:had been|were) necessary|for completeness|hypothetical(?:ly)?|without deciding)\b",
    )
    .expect("obiter pattern is valid")
});

/// Maps court level and paragraph role to an authority tier
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorityDeterminer;

impl AuthorityDeterminer {
    /// Create a determiner
    pub fn new() -> Self {
        Self
    }

    /// Detect the paragraph role from lexical cues alone
    pub fn detect_role(&self, text: &str) -> ParagraphRole {
        if DISSENT_RE.is_match(text) {
            ParagraphRole::Dissent
        } else if OBITER_RE.is_match(text) {
            ParagraphRole::Obiter
        } else {
            ParagraphRole::Majority
        }
    }

    /// Effective role: the stronger of the metadata flag and the detected cue
    pub fn effective_role(&self, metadata: &CaseMetadata, text: &str) -> ParagraphRole {
        let detected = self.detect_role(text);
        match (metadata.role, detected) {
            (ParagraphRole::Dissent, _) | (_, ParagraphRole::Dissent) => ParagraphRole::Dissent,
            (ParagraphRole::Obiter, _) | (_, ParagraphRole::Obiter) => ParagraphRole::Obiter,
            _ => ParagraphRole::Majority,
        }
    }

    /// Authority for a paragraph of the given case
    pub fn determine(&self, metadata: &CaseMetadata, text: &str) -> Authority {
        match self.effective_role(metadata, text) {
            ParagraphRole::Dissent => Authority::Dissenting,
            ParagraphRole::Obiter => Authority::Obiter,
            ParagraphRole::Majority => {
                if metadata.court_level().is_binding() {
                    Authority::Binding
                } else {
                    Authority::Persuasive
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: &str = "We hold that the section requires actual knowledge.";

    #[test]
    fn test_decision_table() {
        let determiner = AuthorityDeterminer::new();
        let cases = [
            ("SGCA", ParagraphRole::Majority, PLAIN, Authority::Binding),
            ("SGHC", ParagraphRole::Majority, PLAIN, Authority::Persuasive),
            ("SGDC", ParagraphRole::Majority, PLAIN, Authority::Persuasive),
            ("SGCA", ParagraphRole::Obiter, PLAIN, Authority::Obiter),
            ("SGHC", ParagraphRole::Obiter, PLAIN, Authority::Obiter),
            ("SGCA", ParagraphRole::Dissent, PLAIN, Authority::Dissenting),
            ("SGHC", ParagraphRole::Dissent, PLAIN, Authority::Dissenting),
        ];
        for (court, role, text, expected) in cases {
            let meta = CaseMetadata::new(court).with_role(role);
            assert_eq!(determiner.determine(&meta, text), expected, "{} {:?}", court, role);
        }
    }

    #[test]
    fn test_dissent_beats_obiter() {
        let meta = CaseMetadata::new("SGCA").with_role(ParagraphRole::Obiter);
        let text = "I would respectfully disagree with the majority's reading of s 2.";
        assert_eq!(AuthorityDeterminer::new().determine(&meta, text), Authority::Dissenting);
    }

    #[test]
    fn test_detected_obiter_on_apex_court() {
        let meta = CaseMetadata::new("SGCA");
        let text = "Although it is unnecessary to decide the point, we observe in passing that s 3 \
                    would not apply to gratuitous promises.";
        assert_eq!(AuthorityDeterminer::new().determine(&meta, text), Authority::Obiter);
    }

    #[test]
    fn test_detect_role_markers() {
        let determiner = AuthorityDeterminer::new();
        assert_eq!(determiner.detect_role("Obiter dicta aside, the rule is clear."), ParagraphRole::Obiter);
        assert_eq!(determiner.detect_role("For completeness, we add that ..."), ParagraphRole::Obiter);
        assert_eq!(determiner.detect_role("In my dissenting judgment I explain why."), ParagraphRole::Dissent);
        assert_eq!(determiner.detect_role(PLAIN), ParagraphRole::Majority);
    }

    #[test]
    fn test_known_false_negative() {
        // No marker phrase, so the heuristic cannot tell this is a dissent
        let text = "My view differs from that of my learned colleagues on s 2.";
        assert_eq!(AuthorityDeterminer::new().detect_role(text), ParagraphRole::Majority);
    }
}
