//! Gatekeeper error types

use thiserror::Error;

/// Errors that can occur during gatekeeper operations
///
/// Validation itself never fails; these cover configuration and the
/// failed-review export.
#[derive(Error, Debug)]
pub enum GatekeeperError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to read or write a file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize the review export
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to render TOML configuration
    #[error("Failed to render config TOML: {0}")]
    TomlRender(#[from] toml::ser::Error),
}
