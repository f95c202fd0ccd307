//! Candidate and report types for extraction

use lexlink_domain::ExtractedLink;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Link proposed by the model, before statute resolution
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LlmLinkCandidate {
    /// Statute name as the model wrote it
    pub statute_name: String,

    /// Section number; models sometimes emit it as a bare number
    #[serde(deserialize_with = "string_or_number")]
    pub section: String,

    /// Interpretation label, parsed leniently later
    #[serde(default)]
    pub interpretation_type: Option<String>,

    /// Model-reported confidence
    #[serde(default)]
    pub confidence: Option<f64>,

    /// Holding statement
    #[serde(default)]
    pub holding: Option<String>,

    /// Whether the model considers the statement part of the ratio
    #[serde(default)]
    pub is_binding: Option<bool>,

    /// Fact-pattern labels
    #[serde(default)]
    pub fact_pattern_tags: Option<Vec<String>>,
}

impl LlmLinkCandidate {
    /// Validate that the candidate names a provision
    pub fn validate(&self) -> Result<(), String> {
        if self.statute_name.trim().is_empty() {
            return Err("Statute name cannot be empty".to_string());
        }
        if self.section.trim().is_empty() {
            return Err("Section cannot be empty".to_string());
        }
        if let Some(c) = self.confidence {
            if c.is_nan() {
                return Err("Confidence cannot be NaN".to_string());
            }
        }
        Ok(())
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!("expected section string, got {}", other))),
    }
}

/// Counters for one LLM-assisted extraction batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmExtractionStats {
    /// Paragraphs considered
    pub screened: usize,

    /// Paragraphs rejected by the cheap pre-filter
    pub prefiltered_out: usize,

    /// Candidates beyond `max_paragraphs`, never sent
    #[serde(default)]
    pub over_cap: usize,

    /// Paragraphs for which a model answer was parsed
    pub succeeded: usize,

    /// Paragraphs dropped after exhausting retries
    pub failed: usize,

    /// Paragraphs not sent because the budget was exhausted
    pub refused: usize,

    /// Paragraphs abandoned because the run was cancelled
    pub cancelled: usize,

    /// Links produced
    pub links: usize,
}

/// Output of an LLM-assisted extraction batch
#[derive(Debug, Clone, Default)]
pub struct LlmExtraction {
    /// Links, sorted by key
    pub links: Vec<ExtractedLink>,

    /// Batch counters
    pub stats: LlmExtractionStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_accepts_numeric_section() {
        let c: LlmLinkCandidate =
            serde_json::from_str(r#"{"statute_name": "Evidence Act", "section": 32}"#).unwrap();
        assert_eq!(c.section, "32");
        assert!(c.validate().is_ok());
        assert_eq!(c.fact_pattern_tags, None);
    }

    #[test]
    fn test_candidate_validation() {
        let c: LlmLinkCandidate =
            serde_json::from_str(r#"{"statute_name": " ", "section": "2"}"#).unwrap();
        assert!(c.validate().is_err());

        let c: LlmLinkCandidate =
            serde_json::from_str(r#"{"statute_name": "Evidence Act", "section": ""}"#).unwrap();
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_candidate_rejects_structured_section() {
        let r: Result<LlmLinkCandidate, _> =
            serde_json::from_str(r#"{"statute_name": "Evidence Act", "section": {"n": 1}}"#);
        assert!(r.is_err());
    }
}
