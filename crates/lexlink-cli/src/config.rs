//! Configuration resolution for the CLI.
//!
//! The pipeline configuration comes from `--config`, else from
//! `<config dir>/lexlink/pipeline.toml` when present, else the defaults.
//! Command-line flags are applied on top.

use crate::cli::{Preset, ProviderKind, RunArgs};
use crate::error::{CliError, Result};
use lexlink_pipeline::PipelineConfig;
use std::env;
use std::path::PathBuf;

/// Environment variable holding the OpenAI API key
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Environment variable overriding the provider endpoint
pub const BASE_URL_VAR: &str = "LEXLINK_LLM_BASE_URL";

/// Default model for each provider
pub fn default_model(provider: ProviderKind) -> &'static str {
    match provider {
        ProviderKind::Openai => "gpt-4o-mini",
        ProviderKind::Ollama => "llama3.1",
    }
}

/// User-level configuration file location.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("lexlink").join("pipeline.toml"))
}

/// Configuration for a preset.
pub fn preset_config(preset: Preset) -> PipelineConfig {
    match preset {
        Preset::Default => PipelineConfig::default(),
        Preset::Strict => PipelineConfig::strict(),
        Preset::Lenient => PipelineConfig::lenient(),
    }
}

/// Resolve the pipeline configuration for a run.
pub fn load_pipeline_config(args: &RunArgs) -> Result<PipelineConfig> {
    let config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Using user configuration");
                PipelineConfig::from_file(path)?
            }
            None => PipelineConfig::default(),
        },
    };
    apply_overrides(config, args)
}

/// Apply command-line flags on top of a loaded configuration.
pub fn apply_overrides(mut config: PipelineConfig, args: &RunArgs) -> Result<PipelineConfig> {
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if args.no_llm {
        config.enable_llm = false;
    }
    if let Some(budget) = args.budget {
        config.llm.budget_usd = Some(budget);
    }
    if let Some(cap) = args.max_llm_paragraphs {
        config.llm.max_paragraphs = Some(cap);
    }
    config.validate().map_err(CliError::Config)?;
    Ok(config)
}

/// Connection settings for the model provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    /// Which backend
    pub kind: ProviderKind,
    /// Model name
    pub model: String,
    /// API key, required by OpenAI
    pub api_key: Option<String>,
    /// Endpoint override
    pub base_url: Option<String>,
}

impl ProviderSettings {
    /// Read provider settings from the arguments and the environment.
    pub fn from_env(args: &RunArgs) -> Self {
        let non_empty = |var: &str| env::var(var).ok().filter(|v| !v.trim().is_empty());
        Self {
            kind: args.provider,
            model: args
                .model
                .clone()
                .unwrap_or_else(|| default_model(args.provider).to_string()),
            api_key: non_empty(API_KEY_VAR),
            base_url: non_empty(BASE_URL_VAR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> RunArgs {
        RunArgs {
            input: PathBuf::from("paragraphs.json"),
            config: None,
            output_dir: None,
            no_llm: false,
            budget: None,
            max_llm_paragraphs: None,
            provider: ProviderKind::Openai,
            model: None,
        }
    }

    #[test]
    fn test_overrides() {
        let args = RunArgs {
            output_dir: Some(PathBuf::from("runs")),
            no_llm: true,
            budget: Some(1.5),
            max_llm_paragraphs: Some(25),
            ..args()
        };
        let config = apply_overrides(PipelineConfig::default(), &args).unwrap();
        assert_eq!(config.llm.max_paragraphs, Some(25));
        assert_eq!(config.output_dir, PathBuf::from("runs"));
        assert!(!config.enable_llm);
        assert_eq!(config.llm.budget_usd, Some(1.5));
    }

    #[test]
    fn test_negative_budget_rejected() {
        let args = RunArgs {
            budget: Some(-1.0),
            ..args()
        };
        assert!(matches!(
            apply_overrides(PipelineConfig::default(), &args),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn test_explicit_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        std::fs::write(&path, "[validation]\nthreshold = 0.9\n").unwrap();
        let args = RunArgs {
            config: Some(path),
            ..args()
        };
        let config = load_pipeline_config(&args).unwrap();
        assert_eq!(config.validation.threshold, 0.9);
    }

    #[test]
    fn test_missing_config_file() {
        let args = RunArgs {
            config: Some(PathBuf::from("/nonexistent/pipeline.toml")),
            ..args()
        };
        assert!(matches!(load_pipeline_config(&args), Err(CliError::Pipeline(_))));
    }

    #[test]
    fn test_presets() {
        assert_eq!(preset_config(Preset::Strict), PipelineConfig::strict());
        assert_eq!(preset_config(Preset::Default), PipelineConfig::default());
    }

    #[test]
    fn test_default_model() {
        let settings = ProviderSettings::from_env(&RunArgs {
            provider: ProviderKind::Ollama,
            ..args()
        });
        assert_eq!(settings.model, "llama3.1");
        assert_eq!(settings.kind, ProviderKind::Ollama);
    }
}
