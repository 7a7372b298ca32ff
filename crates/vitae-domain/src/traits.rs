//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::completion::{CompletionRequest, CompletionResponse};
use async_trait::async_trait;

/// Trait for the generative text-completion service
///
/// Implemented by the infrastructure layer (vitae-llm). The pipeline treats
/// the service as an opaque call: prompt and sampling parameters in,
/// completion text out. Calling this is the only point where the pipeline
/// suspends.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Error type for completion calls
    type Error: std::error::Error + Send + Sync + 'static;

    /// Complete a prompt
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, Self::Error>;

    /// Name of the model behind this provider, for logs and health reports
    fn model_name(&self) -> &str;
}
