//! Error types for the résumé pipeline

use thiserror::Error;
use vitae_llm::PoolError;

/// Errors that stop the pipeline before a decode outcome exists
///
/// An undecodable completion is not an error; it is reported through
/// [`vitae_domain::DecodeOutcome::Undecodable`].
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Declared format is neither PDF nor DOCX
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The document could not be read
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// The document contains no extractable text
    #[error("Document contains no extractable text")]
    EmptyDocument,

    /// The fixed prompt leaves no room for input
    #[error("Prompt too large: {0}")]
    PromptTooLarge(String),

    /// The completion service timed out on every attempt
    #[error("Model timed out after {attempts} attempts")]
    ModelTimeout {
        /// Attempts made before giving up
        attempts: u32,
    },

    /// Completion service error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExtractorError {
    /// Stable snake_case label used in API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractorError::UnsupportedFormat(_) => "unsupported_format",
            ExtractorError::Extraction(_) => "extraction",
            ExtractorError::EmptyDocument => "empty_document",
            ExtractorError::PromptTooLarge(_) => "prompt_too_large",
            ExtractorError::ModelTimeout { .. } => "model_timeout",
            ExtractorError::Llm(_) => "llm",
            ExtractorError::Config(_) => "config",
        }
    }
}

impl<E: std::fmt::Display> From<PoolError<E>> for ExtractorError {
    fn from(e: PoolError<E>) -> Self {
        match e {
            PoolError::Timeout { attempts, .. } => ExtractorError::ModelTimeout { attempts },
            other => ExtractorError::Llm(other.to_string()),
        }
    }
}
