//! Configuration file parsing for the server.
//!
//! Loads the bind address, upload limit, completion backend and extractor
//! settings from a TOML file.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use vitae_extractor::ExtractorConfig;
use vitae_llm::{BackendKind, CompletionConfig, PoolConfig};

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// A value is out of range or inconsistent
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Server configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub bind_address: String,

    /// Bind port (e.g., 8000)
    pub bind_port: u16,

    /// Largest accepted request body, in bytes (default: 10 MiB)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Completion service settings
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Pipeline settings
    #[serde(default)]
    pub extractor: ExtractorConfig,
}

/// Default upload limit: 10 MiB
fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check required fields and ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.completion.model.is_empty() {
            return Err(ConfigError::MissingField("completion.model".to_string()));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid("max_upload_bytes must be > 0".to_string()));
        }
        self.completion
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("completion: {}", e)))?;
        self.extractor
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("extractor: {}", e)))?;
        Ok(())
    }

    /// Create a default configuration for testing
    ///
    /// Uses the mock backend, so nothing listens on the network.
    pub fn default_test_config() -> Self {
        ServerConfig {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 8000,
            max_upload_bytes: default_max_upload_bytes(),
            completion: CompletionConfig {
                backend: BackendKind::Mock,
                model: "mock".to_string(),
                endpoints: Vec::new(),
                pool: PoolConfig::default(),
                mock_response: Some(r#"{"contact": {"name": "Test Candidate"}, "experience": [], "skills": [], "education": []}"#.to_string()),
            },
            extractor: ExtractorConfig::default(),
        }
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}
