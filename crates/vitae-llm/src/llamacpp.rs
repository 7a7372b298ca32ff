//! llama.cpp server provider
//!
//! Talks to the HTTP server bundled with llama.cpp (`llama-server`), which
//! serves a single GGUF model loaded at startup. The model's context size is
//! fixed by the server's `--ctx-size` flag, so only sampling parameters are
//! sent per request.

use crate::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use vitae_domain::{CompletionProvider, CompletionRequest, CompletionResponse, FinishReason};

/// Default llama.cpp server endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080";

/// llama.cpp server provider
pub struct LlamaCppProvider {
    endpoint: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct LlamaCompletionRequest<'a> {
    prompt: &'a str,
    n_predict: u32,
    temperature: f32,
    top_p: f32,
    repeat_penalty: f32,
    stream: bool,
    cache_prompt: bool,
}

#[derive(Deserialize)]
struct LlamaCompletionResponse {
    content: String,
    #[serde(default)]
    stopped_limit: bool,
}

impl LlamaCppProvider {
    /// Create a provider for the server at `endpoint`
    ///
    /// `model` is only a label for logs; the server decides which model runs.
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(crate::ollama::DEFAULT_CONNECT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
        }
    }

    fn request_body<'a>(&self, request: &'a CompletionRequest) -> LlamaCompletionRequest<'a> {
        LlamaCompletionRequest {
            prompt: &request.prompt,
            n_predict: request.params.max_tokens,
            temperature: request.params.temperature,
            top_p: request.params.top_p,
            repeat_penalty: request.params.repeat_penalty,
            stream: false,
            cache_prompt: true,
        }
    }
}

#[async_trait]
impl CompletionProvider for LlamaCppProvider {
    type Error = LlmError;

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, Self::Error> {
        let url = format!("{}/completion", self.endpoint);
        debug!("POST {} ({} prompt chars)", url, request.prompt.len());

        let response = self
            .client
            .post(&url)
            .json(&self.request_body(request))
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Communication(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body: LlamaCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        Ok(CompletionResponse {
            text: body.content,
            finish_reason: if body.stopped_limit {
                FinishReason::Length
            } else {
                FinishReason::Stop
            },
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitae_domain::GenerationParams;

    #[test]
    fn test_request_body() {
        let provider = LlamaCppProvider::new(DEFAULT_ENDPOINT, "Llama-3.2-1B-Instruct");
        let params = GenerationParams {
            max_tokens: 512,
            ..GenerationParams::default()
        };
        let request = CompletionRequest::new("prompt text", params);

        let body = serde_json::to_value(provider.request_body(&request)).unwrap();
        assert_eq!(body["prompt"], "prompt text");
        assert_eq!(body["n_predict"], 512);
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn test_response_parsing_limit() {
        let body: LlamaCompletionResponse = serde_json::from_str(
            r#"{"content": "{\"data\"", "stopped_eos": false, "stopped_limit": true, "tokens_predicted": 512}"#,
        )
        .unwrap();
        assert!(body.stopped_limit);
        assert_eq!(body.content, "{\"data\"");
    }

    #[test]
    fn test_response_parsing_defaults() {
        let body: LlamaCompletionResponse = serde_json::from_str(r#"{"content": "done"}"#).unwrap();
        assert!(!body.stopped_limit);
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let provider = LlamaCppProvider::new("http://localhost:99999", "model");
        let request = CompletionRequest::new("test", GenerationParams::default());
        let result = provider.complete(&request).await;
        assert!(matches!(result, Err(LlmError::Communication(_))));
    }
}
