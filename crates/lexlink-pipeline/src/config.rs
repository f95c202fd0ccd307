//! Configuration for pipeline runs
//!
//! Nests the extractor and validation configurations so that a whole run
//! can be described by one TOML file.

use crate::PipelineError;
use lexlink_extractor::{LlmExtractorConfig, RuleConfig};
use lexlink_gatekeeper::ValidationConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the pipeline orchestrator
///
/// # Examples
///
/// ```
/// use lexlink_pipeline::PipelineConfig;
///
/// // Default configuration (both extractors, threshold 0.75)
/// let config = PipelineConfig::default();
/// assert!(config.enable_llm);
///
/// // Strict: higher validation threshold and a spending ceiling
/// let config = PipelineConfig::strict();
/// assert_eq!(config.validation.threshold, 0.85);
///
/// // Rule-based extraction only
/// let config = PipelineConfig::rule_only();
/// assert!(!config.enable_llm);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Run the pattern-based extractor
    /// Default: true
    pub enable_rule_based: bool,

    /// Run the model-backed extractor (needs a provider)
    /// Default: true
    pub enable_llm: bool,

    /// Directory the link, review and statistics artifacts are written to
    /// Default: "output"
    pub output_dir: PathBuf,

    /// Size of the rule-based worker pool; one per CPU when unset
    pub rule_workers: Option<usize>,

    /// Rule-based extractor settings
    pub rule: RuleConfig,

    /// LLM-assisted extractor settings, budget included
    pub llm: LlmExtractorConfig,

    /// Quality gate settings
    pub validation: ValidationConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enable_rule_based: true,
            enable_llm: true,
            output_dir: PathBuf::from("output"),
            rule_workers: None,
            rule: RuleConfig::default(),
            llm: LlmExtractorConfig::default(),
            validation: ValidationConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Strict preset across every stage
    pub fn strict() -> Self {
        Self {
            rule: RuleConfig::strict(),
            llm: LlmExtractorConfig::strict(),
            validation: ValidationConfig::strict(),
            ..Self::default()
        }
    }

    /// Lenient preset across every stage
    pub fn lenient() -> Self {
        Self {
            rule: RuleConfig::lenient(),
            llm: LlmExtractorConfig::lenient(),
            validation: ValidationConfig::lenient(),
            ..Self::default()
        }
    }

    /// Default configuration with the model-backed extractor disabled
    pub fn rule_only() -> Self {
        Self {
            enable_llm: false,
            ..Self::default()
        }
    }

    /// Set the output directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Validate the configuration and every nested section
    pub fn validate(&self) -> Result<(), String> {
        if !self.enable_rule_based && !self.enable_llm {
            return Err("at least one extractor must be enabled".to_string());
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err("output_dir cannot be empty".to_string());
        }
        if self.rule_workers == Some(0) {
            return Err("rule_workers must be greater than 0".to_string());
        }
        self.rule.validate().map_err(|e| format!("rule: {}", e))?;
        self.llm.validate().map_err(|e| format!("llm: {}", e))?;
        self.validation
            .validate()
            .map_err(|e| format!("validation: {}", e))?;
        Ok(())
    }

    /// Parse a configuration from TOML and validate it
    pub fn from_toml(contents: &str) -> Result<Self, PipelineError> {
        let config: PipelineConfig = toml::from_str(contents)?;
        config.validate().map_err(PipelineError::Config)?;
        Ok(config)
    }

    /// Load a configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, PipelineError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert!(config.enable_rule_based);
        assert!(config.enable_llm);
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        assert!(PipelineConfig::strict().validate().is_ok());
        assert!(PipelineConfig::lenient().validate().is_ok());
        assert!(PipelineConfig::rule_only().validate().is_ok());
        assert_eq!(PipelineConfig::strict().llm.budget_usd, Some(5.0));
        assert_eq!(PipelineConfig::lenient().validation.threshold, 0.6);
    }

    #[test]
    fn test_invalid_config() {
        let config = PipelineConfig {
            enable_rule_based: false,
            enable_llm: false,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PipelineConfig {
            rule_workers: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.validation.threshold = 1.2;
        let err = config.validate().unwrap_err();
        assert!(err.starts_with("validation:"));
    }

    #[test]
    fn test_nested_toml() {
        let config = PipelineConfig::from_toml(
            r#"
            enable_llm = false
            output_dir = "/tmp/lexlink"

            [llm]
            budget_usd = 2.5

            [validation]
            threshold = 0.8
            "#,
        )
        .unwrap();
        assert!(!config.enable_llm);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/lexlink"));
        assert_eq!(config.llm.budget_usd, Some(2.5));
        assert_eq!(config.llm.max_in_flight, 8);
        assert_eq!(config.validation.threshold, 0.8);
        assert_eq!(config.rule, RuleConfig::default());
    }

    #[test]
    fn test_toml_rejects_invalid() {
        assert!(matches!(
            PipelineConfig::from_toml("[llm]\nmax_in_flight = 0"),
            Err(PipelineError::Config(_))
        ));
        assert!(matches!(
            PipelineConfig::from_toml("enable_llm = \"yes\""),
            Err(PipelineError::TomlParse(_))
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = PipelineConfig::strict().with_output_dir("runs");
        let rendered = config.to_toml().unwrap();
        assert_eq!(PipelineConfig::from_toml(&rendered).unwrap(), config);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        std::fs::write(&path, PipelineConfig::lenient().to_toml().unwrap()).unwrap();
        assert_eq!(
            PipelineConfig::from_file(&path).unwrap(),
            PipelineConfig::lenient()
        );
        assert!(matches!(
            PipelineConfig::from_file(dir.path().join("missing.toml")),
            Err(PipelineError::Io(_))
        ));
    }
}
