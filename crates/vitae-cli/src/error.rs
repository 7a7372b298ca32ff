//! Error types for the CLI application.

use thiserror::Error;
use vitae_domain::UndecodableReason;
use vitae_extractor::ExtractorError;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pipeline error
    #[error("{0}")]
    Extractor(#[from] ExtractorError),

    /// The model's output could not be decoded
    #[error("Model output could not be decoded ({0})")]
    Undecodable(UndecodableReason),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CliError {
    /// Process exit code for this error
    ///
    /// 2 for bad input or configuration, 3 for an undecodable completion,
    /// 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::Toml(_) | CliError::InvalidInput(_) => 2,
            CliError::Extractor(ExtractorError::UnsupportedFormat(_)) => 2,
            CliError::Undecodable(_) => 3,
            _ => 1,
        }
    }
}
