//! Vitae LLM Provider Layer
//!
//! Pluggable completion-service clients behind the `CompletionProvider`
//! trait from `vitae-domain`, plus the bounded pool that serializes access
//! to them.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `OllamaProvider`: Local Ollama API integration
//! - `LlamaCppProvider`: llama.cpp `server` integration
//! - `CompletionBackend`: one of the above, built from a `CompletionConfig`
//!
//! # Examples
//!
//! ```
//! use vitae_llm::MockProvider;
//! use vitae_domain::{CompletionProvider, CompletionRequest, GenerationParams};
//!
//! # tokio_test_block_on(async {
//! let provider = MockProvider::new("Hello from LLM!");
//! let request = CompletionRequest::new("test prompt", GenerationParams::default());
//! let result = provider.complete(&request).await.unwrap();
//! assert_eq!(result.text, "Hello from LLM!");
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

#![warn(missing_docs)]

pub mod backend;
pub mod llamacpp;
pub mod ollama;
pub mod pool;

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use vitae_domain::{CompletionProvider, CompletionRequest, CompletionResponse, FinishReason};

pub use backend::{BackendKind, CompletionBackend, CompletionConfig};
pub use llamacpp::LlamaCppProvider;
pub use ollama::OllamaProvider;
pub use pool::{CompletionPool, PoolConfig, PoolError};

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// Mock LLM provider for deterministic testing
///
/// This provider returns pre-configured responses without making any network calls.
/// Responses can be keyed by exact prompt, and per-call delays can be queued
/// to exercise timeout handling.
///
/// # Examples
///
/// ```
/// use vitae_llm::MockProvider;
///
/// // Multiple responses
/// let mut provider = MockProvider::default();
/// provider.add_response("prompt1", "response1");
/// provider.add_response("prompt2", "response2");
/// assert_eq!(provider.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    finish_reason: FinishReason,
    responses: Arc<Mutex<HashMap<String, String>>>,
    delays: Arc<Mutex<VecDeque<Duration>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            finish_reason: FinishReason::Stop,
            responses: Arc::new(Mutex::new(HashMap::new())),
            delays: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Report this finish reason on every response
    pub fn with_finish_reason(mut self, finish_reason: FinishReason) -> Self {
        self.finish_reason = finish_reason;
        self
    }

    /// Queue per-call delays; call N sleeps for the Nth delay, later calls
    /// answer immediately
    pub fn with_delays(self, delays: impl IntoIterator<Item = Duration>) -> Self {
        self.delays.lock().unwrap().extend(delays);
        self
    }

    /// Add a specific response for a given prompt
    pub fn add_response(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .insert(prompt.into(), response.into());
    }

    /// Configure to return an error for a specific prompt
    pub fn add_error(&mut self, prompt: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .insert(prompt.into(), "ERROR".to_string());
    }

    /// Get the number of times complete was called
    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// Prompts received, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Reset the call log
    pub fn reset_call_count(&self) {
        self.prompts.lock().unwrap().clear();
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    type Error = LlmError;

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, Self::Error> {
        self.prompts.lock().unwrap().push(request.prompt.clone());

        let delay = self.delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        // Check if we have a specific response for this prompt
        let response = self.responses.lock().unwrap().get(&request.prompt).cloned();
        let text = match response {
            Some(response) if response == "ERROR" => {
                return Err(LlmError::Other("Mock error".to_string()));
            }
            Some(response) => response,
            None => self.default_response.clone(),
        };

        Ok(CompletionResponse {
            text,
            finish_reason: self.finish_reason.clone(),
        })
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
