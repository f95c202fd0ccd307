//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and
//! infrastructure. Implementations live in other crates.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::Arc;

/// Token counts reported for one model call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens sent to the model
    pub prompt_tokens: u64,
    /// Tokens produced by the model
    pub completion_tokens: u64,
}

impl TokenUsage {
    /// Total tokens for the call
    pub fn total(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Text returned by a model call together with its token usage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Raw response text
    pub text: String,
    /// Token usage for cost accounting
    pub usage: TokenUsage,
}

/// Trait for LLM provider operations
///
/// Implemented by the infrastructure layer (lexlink-llm)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Error type for LLM operations
    type Error: Display + Send + 'static;

    /// Generate a completion for a prompt, requesting JSON output
    async fn generate(&self, prompt: &str) -> Result<Completion, Self::Error>;

    /// Name of the model behind this provider, used in logs and statistics
    fn model_name(&self) -> &str;
}

#[async_trait]
impl<P: LlmProvider + ?Sized> LlmProvider for Arc<P> {
    type Error = P::Error;

    async fn generate(&self, prompt: &str) -> Result<Completion, Self::Error> {
        (**self).generate(prompt).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}
