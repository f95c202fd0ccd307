//! Error types for the Extractor

use thiserror::Error;

/// Errors that can occur during extraction
///
/// None of these abort a batch: the extractors log them and treat the
/// paragraph as having produced no links.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractorError {
    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Model call did not finish within the configured timeout
    #[error("Extraction timeout")]
    Timeout,

    /// Model response could not be parsed
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),

    /// Budget ceiling reached; no further model calls are made
    #[error("LLM budget exhausted: ${spent:.4} of ${budget:.4} spent")]
    BudgetExhausted {
        /// Dollars spent so far
        spent: f64,
        /// Configured ceiling in dollars
        budget: f64,
    },

    /// Run was cancelled
    #[error("Extraction cancelled")]
    Cancelled,

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::JsonParse(e.to_string())
    }
}

impl ExtractorError {
    /// Whether another attempt at the same call could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExtractorError::Llm(_)
                | ExtractorError::Timeout
                | ExtractorError::InvalidFormat(_)
                | ExtractorError::JsonParse(_)
        )
    }
}
