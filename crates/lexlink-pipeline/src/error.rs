//! Error types for the pipeline

use thiserror::Error;

/// Errors that can occur while configuring or exporting a run
///
/// A run itself never fails; these surface from configuration loading and
/// from individual exports, which are reported rather than propagated.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to read or write a file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize an export
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to render TOML configuration
    #[error("Failed to render config TOML: {0}")]
    TomlRender(#[from] toml::ser::Error),

    /// Failed to build the rule-based worker pool
    #[error("Worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
