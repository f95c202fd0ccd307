//! Configuration for the extractors

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the rule-based extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Sentences on either side of the citation searched for interpretive patterns
    pub window_sentences: usize,

    /// Confidence for a link backed by a single interpretive trigger
    pub base_confidence: f64,

    /// Confidence added per additional trigger
    pub confidence_step: f64,

    /// Upper bound of the rule-based confidence band
    pub max_confidence: f64,

    /// Maximum holding length (characters)
    pub max_holding_chars: usize,
}

impl RuleConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("base_confidence", self.base_confidence),
            ("confidence_step", self.confidence_step),
            ("max_confidence", self.max_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be within [0, 1], got {}", name, value));
            }
        }
        if self.base_confidence > self.max_confidence {
            return Err("base_confidence cannot exceed max_confidence".to_string());
        }
        if self.max_holding_chars == 0 {
            return Err("max_holding_chars must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Strict preset: only the citation's own sentence is searched
    pub fn strict() -> Self {
        Self {
            window_sentences: 0,
            ..Self::default()
        }
    }

    /// Lenient preset: wider window, lower starting confidence
    pub fn lenient() -> Self {
        Self {
            window_sentences: 2,
            base_confidence: 0.8,
            ..Self::default()
        }
    }
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            window_sentences: 1,
            base_confidence: 0.85,
            confidence_step: 0.05,
            max_confidence: 0.95,
            max_holding_chars: 300,
        }
    }
}

/// Token pricing used to estimate model cost
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pricing {
    /// Dollars per million prompt tokens
    pub input_per_million: f64,

    /// Dollars per million completion tokens
    pub output_per_million: f64,
}

impl Default for Pricing {
    /// gpt-4o-mini list prices
    fn default() -> Self {
        Self {
            input_per_million: 0.15,
            output_per_million: 0.60,
        }
    }
}

impl Pricing {
    /// Estimated cost in dollars of one call
    pub fn cost(&self, prompt_tokens: u64, completion_tokens: u64) -> f64 {
        (prompt_tokens as f64 / 1_000_000.0) * self.input_per_million
            + (completion_tokens as f64 / 1_000_000.0) * self.output_per_million
    }
}

/// Configuration for the LLM-assisted extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmExtractorConfig {
    /// Paragraphs shorter than this are never sent to the model (characters)
    pub min_paragraph_chars: usize,

    /// Paragraph text beyond this length is cut before prompting (characters)
    pub max_paragraph_chars: usize,

    /// Maximum concurrent model calls
    pub max_in_flight: usize,

    /// Maximum time for a single model call (seconds)
    pub call_timeout_secs: u64,

    /// Attempts per paragraph, including the first
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds); doubles per retry
    pub initial_backoff_ms: u64,

    /// Upper bound on the retry delay (milliseconds)
    pub max_backoff_ms: u64,

    /// Spending ceiling in dollars; unlimited when unset
    pub budget_usd: Option<f64>,

    /// Most paragraphs sent to the model per batch, in input order; unlimited when unset
    pub max_paragraphs: Option<usize>,

    /// Confidence assigned when the model reports none
    pub default_confidence: f64,

    /// Lower bound of the model confidence band
    pub min_confidence: f64,

    /// Upper bound of the model confidence band
    pub max_confidence: f64,

    /// Token pricing
    pub pricing: Pricing,
}

impl LlmExtractorConfig {
    /// Get the per-call timeout as a Duration
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Delay before retry number `retry` (1-based): 1s, 2s, 4s, ... capped
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u64.saturating_pow(retry.saturating_sub(1));
        let millis = self.initial_backoff_ms.saturating_mul(factor);
        Duration::from_millis(millis.min(self.max_backoff_ms))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_in_flight == 0 {
            return Err("max_in_flight must be greater than 0".to_string());
        }
        if self.max_attempts == 0 {
            return Err("max_attempts must be greater than 0".to_string());
        }
        if self.call_timeout_secs == 0 {
            return Err("call_timeout_secs must be greater than 0".to_string());
        }
        if self.max_paragraph_chars < self.min_paragraph_chars {
            return Err("max_paragraph_chars cannot be below min_paragraph_chars".to_string());
        }
        if self.max_paragraphs == Some(0) {
            return Err("max_paragraphs must be greater than 0 when set".to_string());
        }
        if let Some(budget) = self.budget_usd {
            if !budget.is_finite() || budget < 0.0 {
                return Err(format!("budget_usd must be a non-negative amount, got {}", budget));
            }
        }
        for (name, value) in [
            ("default_confidence", self.default_confidence),
            ("min_confidence", self.min_confidence),
            ("max_confidence", self.max_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be within [0, 1], got {}", name, value));
            }
        }
        if self.min_confidence > self.max_confidence {
            return Err("min_confidence cannot exceed max_confidence".to_string());
        }
        if self.pricing.input_per_million < 0.0 || self.pricing.output_per_million < 0.0 {
            return Err("pricing cannot be negative".to_string());
        }
        Ok(())
    }

    /// Strict preset: fewer concurrent calls, fewer retries, small budget
    pub fn strict() -> Self {
        Self {
            min_paragraph_chars: 150,
            max_in_flight: 4,
            max_attempts: 2,
            budget_usd: Some(5.0),
            ..Self::default()
        }
    }

    /// Lenient preset: more concurrency and retries, no budget
    pub fn lenient() -> Self {
        Self {
            min_paragraph_chars: 60,
            max_in_flight: 16,
            max_attempts: 5,
            call_timeout_secs: 120,
            budget_usd: None,
            ..Self::default()
        }
    }
}

impl Default for LlmExtractorConfig {
    fn default() -> Self {
        Self {
            min_paragraph_chars: 100,
            max_paragraph_chars: 12_000,
            max_in_flight: 8,
            call_timeout_secs: 60,
            max_attempts: 3,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 8_000,
            budget_usd: None,
            max_paragraphs: None,
            default_confidence: 0.7,
            min_confidence: 0.6,
            max_confidence: 0.85,
            pricing: Pricing::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs_are_valid() {
        assert!(RuleConfig::default().validate().is_ok());
        assert!(LlmExtractorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(RuleConfig::strict().validate().is_ok());
        assert!(RuleConfig::lenient().validate().is_ok());
        assert!(LlmExtractorConfig::strict().validate().is_ok());
        assert!(LlmExtractorConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_invalid_rule_band() {
        let mut config = RuleConfig::default();
        config.base_confidence = 0.97;
        assert!(config.validate().is_err());

        config.base_confidence = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_llm_config() {
        let mut config = LlmExtractorConfig::default();
        config.max_in_flight = 0;
        assert!(config.validate().is_err());

        let mut config = LlmExtractorConfig::default();
        config.budget_usd = Some(-1.0);
        assert!(config.validate().is_err());

        let mut config = LlmExtractorConfig::default();
        config.min_confidence = 0.9;
        assert!(config.validate().is_err());

        let mut config = LlmExtractorConfig::default();
        config.max_paragraphs = Some(0);
        assert!(config.validate().is_err());
        config.max_paragraphs = Some(1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = LlmExtractorConfig::default();
        assert_eq!(config.backoff(1), Duration::from_secs(1));
        assert_eq!(config.backoff(2), Duration::from_secs(2));
        assert_eq!(config.backoff(3), Duration::from_secs(4));
        assert_eq!(config.backoff(10), Duration::from_secs(8));
    }

    #[test]
    fn test_pricing_cost() {
        let pricing = Pricing::default();
        let cost = pricing.cost(1_000_000, 1_000_000);
        assert!((cost - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = LlmExtractorConfig::default();
        config.budget_usd = Some(2.5);
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: LlmExtractorConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);

        let partial: RuleConfig = toml::from_str("window_sentences = 2").unwrap();
        assert_eq!(partial.window_sentences, 2);
        assert_eq!(partial.max_confidence, 0.95);
    }
}
