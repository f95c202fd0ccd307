//! Gatekeeper configuration

use crate::GatekeeperError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Relative weight of each check in the aggregate score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckWeights {
    /// The statute is cited in the source paragraph
    pub statute_mentioned: f64,

    /// Confidence and boost are in range and confidence meets the minimum
    pub confidence_in_range: f64,

    /// Authority label agrees with the court and paragraph role
    pub authority_consistency: f64,

    /// A holding accompanies rule-based links
    pub holding_presence: f64,

    /// The paragraph reads like an interpretation, not a bare reference
    pub text_alignment: f64,
}

impl Default for CheckWeights {
    fn default() -> Self {
        Self {
            statute_mentioned: 0.35,
            confidence_in_range: 0.20,
            authority_consistency: 0.20,
            holding_presence: 0.10,
            text_alignment: 0.15,
        }
    }
}

impl CheckWeights {
    /// Sum of all weights
    pub fn total(&self) -> f64 {
        self.statute_mentioned
            + self.confidence_in_range
            + self.authority_consistency
            + self.holding_presence
            + self.text_alignment
    }
}

/// Configuration for validation rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Minimum aggregate score for a link to pass (0.0-1.0)
    pub threshold: f64,

    /// Confidence below this only earns half marks on the range check
    pub min_confidence: f64,

    /// Source paragraphs shorter than this are suspect (characters)
    pub min_text_chars: usize,

    /// Rule-based holdings shorter than this only earn half marks (characters)
    pub min_holding_chars: usize,

    /// Length of the paragraph excerpt in the review export (characters)
    pub review_excerpt_chars: usize,

    /// Check weights
    pub weights: CheckWeights,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            threshold: 0.75,
            min_confidence: 0.6,
            min_text_chars: 50,
            min_holding_chars: 20,
            review_excerpt_chars: 200,
            weights: CheckWeights::default(),
        }
    }
}

impl ValidationConfig {
    /// Create a lenient configuration (lower pass threshold)
    pub fn lenient() -> Self {
        Self {
            threshold: 0.6,
            min_confidence: 0.5,
            ..Self::default()
        }
    }

    /// Create a strict configuration
    pub fn strict() -> Self {
        Self {
            threshold: 0.85,
            min_confidence: 0.7,
            min_holding_chars: 40,
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(format!("threshold must be within [0, 1], got {}", self.threshold));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(format!(
                "min_confidence must be within [0, 1], got {}",
                self.min_confidence
            ));
        }
        let w = &self.weights;
        for (name, value) in [
            ("statute_mentioned", w.statute_mentioned),
            ("confidence_in_range", w.confidence_in_range),
            ("authority_consistency", w.authority_consistency),
            ("holding_presence", w.holding_presence),
            ("text_alignment", w.text_alignment),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("weight {} must be non-negative, got {}", name, value));
            }
        }
        if w.total() <= 0.0 {
            return Err("at least one check weight must be positive".to_string());
        }
        Ok(())
    }

    /// Parse a configuration from TOML and validate it
    pub fn from_toml(contents: &str) -> Result<Self, GatekeeperError> {
        let config: ValidationConfig = toml::from_str(contents)?;
        config.validate().map_err(GatekeeperError::Config)?;
        Ok(config)
    }

    /// Load a configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, GatekeeperError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, GatekeeperError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
