//! Backend selection from configuration

use crate::{llamacpp, ollama, LlamaCppProvider, LlmError, MockProvider, OllamaProvider, PoolConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vitae_domain::{CompletionProvider, CompletionRequest, CompletionResponse};

/// Model used when the configuration names none
pub const DEFAULT_MODEL: &str = "llama3.2:1b";

/// Which completion service to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Ollama `/api/generate`
    #[default]
    Ollama,
    /// llama.cpp server `/completion`
    LlamaCpp,
    /// In-process mock
    Mock,
}

/// Completion service settings, the `[completion]` table of a config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Which backend to talk to
    pub backend: BackendKind,

    /// Model name (label only for llama.cpp)
    pub model: String,

    /// One pool instance per endpoint; empty means the backend's default
    pub endpoints: Vec<String>,

    /// Canned completion for the mock backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mock_response: Option<String>,

    /// Timeout and retry settings
    pub pool: PoolConfig,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            model: DEFAULT_MODEL.to_string(),
            endpoints: Vec::new(),
            mock_response: None,
            pool: PoolConfig::default(),
        }
    }
}

impl CompletionConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        if self.endpoints.iter().any(|e| e.trim().is_empty()) {
            return Err("endpoints must not contain blank entries".to_string());
        }
        self.pool.validate()
    }

    /// Build one backend instance per configured endpoint
    ///
    /// `context_window_tokens` is forwarded to backends that accept it per
    /// request. The mock backend gets one instance per endpoint too, or a
    /// single one when none are listed.
    pub fn backends(&self, context_window_tokens: usize) -> Vec<CompletionBackend> {
        let ctx = u32::try_from(context_window_tokens).unwrap_or(u32::MAX);

        match self.backend {
            BackendKind::Ollama => self
                .endpoints_or(ollama::DEFAULT_ENDPOINT)
                .into_iter()
                .map(|endpoint| {
                    CompletionBackend::Ollama(
                        OllamaProvider::new(endpoint, self.model.clone()).with_context_window(ctx),
                    )
                })
                .collect(),
            BackendKind::LlamaCpp => self
                .endpoints_or(llamacpp::DEFAULT_ENDPOINT)
                .into_iter()
                .map(|endpoint| CompletionBackend::LlamaCpp(LlamaCppProvider::new(endpoint, self.model.clone())))
                .collect(),
            BackendKind::Mock => {
                let response = self.mock_response.clone().unwrap_or_else(|| "{}".to_string());
                (0..self.endpoints.len().max(1))
                    .map(|_| CompletionBackend::Mock(MockProvider::new(response.clone())))
                    .collect()
            }
        }
    }

    fn endpoints_or(&self, default: &str) -> Vec<String> {
        if self.endpoints.is_empty() {
            vec![default.to_string()]
        } else {
            self.endpoints.clone()
        }
    }
}

/// A provider chosen at runtime from configuration
pub enum CompletionBackend {
    /// Ollama API
    Ollama(OllamaProvider),
    /// llama.cpp server
    LlamaCpp(LlamaCppProvider),
    /// Deterministic mock
    Mock(MockProvider),
}

#[async_trait]
impl CompletionProvider for CompletionBackend {
    type Error = LlmError;

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, Self::Error> {
        match self {
            CompletionBackend::Ollama(provider) => provider.complete(request).await,
            CompletionBackend::LlamaCpp(provider) => provider.complete(request).await,
            CompletionBackend::Mock(provider) => provider.complete(request).await,
        }
    }

    fn model_name(&self) -> &str {
        match self {
            CompletionBackend::Ollama(provider) => provider.model_name(),
            CompletionBackend::LlamaCpp(provider) => provider.model_name(),
            CompletionBackend::Mock(provider) => provider.model_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitae_domain::{FinishReason, GenerationParams};

    #[tokio::test]
    async fn test_backend_dispatches_to_mock() {
        let backend = CompletionBackend::Mock(
            MockProvider::new("{}").with_finish_reason(FinishReason::Length),
        );
        assert_eq!(backend.model_name(), "mock");

        let request = CompletionRequest::new("p", GenerationParams::default());
        let response = backend.complete(&request).await.unwrap();
        assert_eq!(response.text, "{}");
        assert_eq!(response.finish_reason, FinishReason::Length);
    }

    #[test]
    fn test_backend_kind_from_toml_label() {
        let config: CompletionConfig = toml::from_str(r#"backend = "llamacpp""#).unwrap();
        assert_eq!(config.backend, BackendKind::LlamaCpp);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_backend_is_one_ollama_instance() {
        let backends = CompletionConfig::default().backends(8192);
        assert_eq!(backends.len(), 1);
        assert!(matches!(backends[0], CompletionBackend::Ollama(_)));
        assert_eq!(backends[0].model_name(), DEFAULT_MODEL);
    }

    #[test]
    fn test_one_instance_per_endpoint() {
        let config = CompletionConfig {
            backend: BackendKind::LlamaCpp,
            endpoints: vec!["http://a:8080".to_string(), "http://b:8080/".to_string()],
            ..CompletionConfig::default()
        };
        assert_eq!(config.backends(4096).len(), 2);
    }

    #[test]
    fn test_validate_rejects_blank_model_and_endpoint() {
        let mut config = CompletionConfig::default();
        config.model = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = CompletionConfig::default();
        config.endpoints = vec![String::new()];
        assert!(config.validate().is_err());
    }
}
