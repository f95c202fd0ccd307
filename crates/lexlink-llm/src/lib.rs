//! Lexlink LLM Provider Layer
//!
//! Pluggable LLM provider implementations.
//!
//! # Architecture
//!
//! This crate provides implementations of the `LlmProvider` trait from `lexlink-domain`.
//! Providers make exactly one request per call; retry and backoff belong to
//! the caller, which also has to retry unparseable responses.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `OllamaProvider`: Local Ollama API integration
//! - `OpenAiProvider`: OpenAI-compatible chat completions API
//!
//! # Examples
//!
//! ```
//! use lexlink_llm::MockProvider;
//! use lexlink_domain::LlmProvider;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let provider = MockProvider::new("[]");
//! let completion = provider.generate("test prompt").await.unwrap();
//! assert_eq!(completion.text, "[]");
//! # });
//! ```

#![warn(missing_docs)]

pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use lexlink_domain::traits::{Completion, LlmProvider as LlmProviderTrait, TokenUsage};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Request did not complete in time
    #[error("Request timed out")]
    Timeout,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Provider could not be configured
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Communication(e.to_string())
        }
    }
}

/// Rough token estimate used when a backend does not report usage
pub fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(4)
}

/// Mock LLM provider for deterministic testing
///
/// This provider returns pre-configured responses without making any network calls.
/// Responses are keyed by a substring of the prompt; the first registered key
/// found in the prompt wins, otherwise the default response is returned.
/// Token usage is estimated at four characters per token.
///
/// # Examples
///
/// ```
/// use lexlink_llm::MockProvider;
/// use lexlink_domain::LlmProvider;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let mut provider = MockProvider::default();
/// provider.add_response("Defamation", r#"[{"statute_name": "Defamation Act", "section": "7"}]"#);
/// let completion = provider.generate("... s 7 of the Defamation Act ...").await.unwrap();
/// assert!(completion.text.contains("Defamation Act"));
/// assert_eq!(provider.generate("unrelated").await.unwrap().text, "[]");
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<Vec<(String, Result<String, LlmError>)>>>,
    scripted_failures: Arc<Mutex<VecDeque<LlmError>>>,
    call_count: Arc<Mutex<usize>>,
    delay: Option<Duration>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(Vec::new())),
            scripted_failures: Arc::new(Mutex::new(VecDeque::new())),
            call_count: Arc::new(Mutex::new(0)),
            delay: None,
        }
    }

    /// Add a response for prompts containing `prompt_fragment`
    pub fn add_response(&mut self, prompt_fragment: impl Into<String>, response: impl Into<String>) {
        lock(&self.responses).push((prompt_fragment.into(), Ok(response.into())));
    }

    /// Configure to return an error for prompts containing `prompt_fragment`
    pub fn add_error(&mut self, prompt_fragment: impl Into<String>) {
        lock(&self.responses).push((
            prompt_fragment.into(),
            Err(LlmError::Other("Mock error".to_string())),
        ));
    }

    /// Fail the next `count` calls with a communication error, whatever the prompt
    pub fn fail_next(&self, count: usize) {
        let mut failures = lock(&self.scripted_failures);
        for _ in 0..count {
            failures.push_back(LlmError::Communication("Mock transient failure".to_string()));
        }
    }

    /// Sleep before answering every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        *lock(&self.call_count)
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        *lock(&self.call_count) = 0;
    }

    fn respond(&self, prompt: &str) -> Result<String, LlmError> {
        *lock(&self.call_count) += 1;

        if let Some(failure) = lock(&self.scripted_failures).pop_front() {
            return Err(failure);
        }

        let responses = lock(&self.responses);
        match responses.iter().find(|(fragment, _)| prompt.contains(fragment.as_str())) {
            Some((_, response)) => response.clone(),
            None => Ok(self.default_response.clone()),
        }
    }
}

impl Default for MockProvider {
    /// A provider that finds nothing
    fn default() -> Self {
        Self::new("[]")
    }
}

#[async_trait]
impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    async fn generate(&self, prompt: &str) -> Result<Completion, Self::Error> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let text = self.respond(prompt)?;
        let usage = TokenUsage {
            prompt_tokens: estimate_tokens(prompt),
            completion_tokens: estimate_tokens(&text),
        };
        Ok(Completion { text, usage })
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

/// Lock a mock's shared state, recovering the data if a test thread panicked
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
