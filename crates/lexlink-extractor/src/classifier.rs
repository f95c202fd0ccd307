//! Interpretation type classification
//!
//! An ordered table of lexical rules; the first rule with a trigger present
//! wins. Precedence, highest first:
//!
//! 1. overrule
//! 2. distinguish
//! 3. broad by negation (`not limited to`), which must beat the narrow
//!    trigger `limited to`
//! 4. narrow
//! 5. broad
//! 6. purposive
//! 7. clarify
//!
//! When nothing matches, the label falls back to `Clarify`.

use lexlink_domain::InterpretationType;
use regex::Regex;
use std::sync::LazyLock;

/// One row of the rule table
struct Rule {
    label: InterpretationType,
    pattern: Regex,
}

fn rule(label: InterpretationType, pattern: &str) -> Rule {
    Rule {
        label,
        pattern: Regex::new(&format!(r"(?i)\b(?:{})\b", pattern))
            .expect("classifier pattern is valid"),
    }
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        rule(
            InterpretationType::Overrule,
            r"overrul(?:e|ed|es|ing)|no longer good law|wrongly decided|depart(?:ed|ing)? from",
        ),
        rule(
            InterpretationType::Distinguish,
            r"distinguish(?:ed|es|ing|able)?|on different facts|not applicable to the (?:present|instant) case",
        ),
        rule(
            InterpretationType::Broad,
            r"not (?:limited|confined|restricted) to|(?:should|must|ought) not be (?:read|construed|interpreted) (?:narrowly|restrictively)",
        ),
        rule(
            InterpretationType::Narrow,
            r"narrow(?:ly|ing|ed|er|s)?|restrictive(?:ly)?|restrict(?:s|ed)?|(?:limited|confined) to|strictly construed|read down|only (?:applies|apply)",
        ),
        rule(
            InterpretationType::Broad,
            r"broad(?:ly|er|ening|ened)?|expansive(?:ly)?|wide(?:ly|r)?|liberal(?:ly)?|extends? to|encompass(?:es|ing)?",
        ),
        rule(
            InterpretationType::Purposive,
            r"purposive(?:ly)?|purpose of|legislative (?:intent|intention|purpose)|parliamentary intention|intention of parliament|mischief",
        ),
        rule(
            InterpretationType::Clarify,
            r"means|meaning of|interpret(?:s|ed|ing|ation)?|constru(?:e|ed|es|ing|ction)|clarif(?:y|ies|ied|ication)|held that|refers to|requires?|defin(?:es|ed|ition)|applies to|to be read as",
        ),
    ]
});

/// Result of classifying a text window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Winning label
    pub label: InterpretationType,
    /// Number of trigger occurrences of the winning rule (0 for the fallback)
    pub hits: usize,
}

impl Classification {
    /// Whether the label came from a rule rather than the fallback
    pub fn is_matched(&self) -> bool {
        self.hits > 0
    }
}

/// Labels a paragraph's interpretive stance from linguistic cues
#[derive(Debug, Clone, Copy, Default)]
pub struct InterpretationClassifier;

impl InterpretationClassifier {
    /// Create a classifier
    pub fn new() -> Self {
        Self
    }

    /// First matching rule for `text`, or `None` if no trigger is present
    pub fn match_rules(&self, text: &str) -> Option<Classification> {
        RULES.iter().find_map(|rule| {
            let hits = rule.pattern.find_iter(text).count();
            (hits > 0).then_some(Classification {
                label: rule.label,
                hits,
            })
        })
    }

    /// Classify the citation window, then the whole paragraph, then fall back
    /// to `Clarify`
    pub fn classify(&self, window: &str, paragraph: &str) -> Classification {
        self.match_rules(window)
            .or_else(|| self.match_rules(paragraph))
            .unwrap_or(Classification {
                label: InterpretationType::default(),
                hits: 0,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(text: &str) -> InterpretationType {
        InterpretationClassifier::new().classify(text, text).label
    }

    #[test]
    fn test_rule_table() {
        let cases = [
            ("We overrule the earlier decision on s 4.", InterpretationType::Overrule),
            ("That case is distinguishable on its facts.", InterpretationType::Distinguish),
            ("The term is not limited to physical harm.", InterpretationType::Broad),
            ("The provision must be read narrowly.", InterpretationType::Narrow),
            ("Relief is confined to cases of fraud.", InterpretationType::Narrow),
            ("The section should be given a broad reading.", InterpretationType::Broad),
            ("Having regard to the legislative intent, we adopt that view.", InterpretationType::Purposive),
            ("The word 'publication' means communication to a third party.", InterpretationType::Clarify),
        ];
        for (text, expected) in cases {
            assert_eq!(label(text), expected, "text: {}", text);
        }
    }

    #[test]
    fn test_precedence_narrow_beats_broad() {
        let text = "s.7 requires proof of positive public benefit, narrowing the prior broad reading.";
        assert_eq!(label(text), InterpretationType::Narrow);
    }

    #[test]
    fn test_precedence_overrule_beats_everything() {
        let text = "We overrule the narrow reading and construe the section broadly.";
        assert_eq!(label(text), InterpretationType::Overrule);
    }

    #[test]
    fn test_negated_limitation_is_broad() {
        assert_eq!(label("It is not confined to contracts of sale."), InterpretationType::Broad);
    }

    #[test]
    fn test_fallback_is_clarify_with_no_hits() {
        let c = InterpretationClassifier::new().classify("Nothing here.", "Nor here.");
        assert_eq!(c.label, InterpretationType::Clarify);
        assert_eq!(c.hits, 0);
        assert!(!c.is_matched());
    }

    #[test]
    fn test_window_preferred_over_paragraph() {
        let classifier = InterpretationClassifier::new();
        let c = classifier.classify("The court construed s 2.", "Earlier cases read it broadly.");
        assert_eq!(c.label, InterpretationType::Clarify);

        let c = classifier.classify("Counsel cited s 2.", "Earlier cases read it broadly.");
        assert_eq!(c.label, InterpretationType::Broad);
    }

    #[test]
    fn test_hits_counted() {
        let c = InterpretationClassifier::new()
            .match_rules("It is narrow. Read narrowly, it is restrictive.")
            .unwrap();
        assert_eq!(c.label, InterpretationType::Narrow);
        assert_eq!(c.hits, 3);
    }

    #[test]
    fn test_no_match() {
        assert!(InterpretationClassifier::new()
            .match_rules("The defendant relied on s.7 of the Act.")
            .is_none());
    }
}
