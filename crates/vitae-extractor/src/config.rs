//! Configuration for the résumé pipeline

use crate::prompt::PromptBuilder;
use serde::{Deserialize, Serialize};
use vitae_domain::GenerationParams;

/// Which end of an oversized document to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TruncationPolicy {
    /// Keep the beginning (contact details usually live there)
    #[default]
    Head,
    /// Keep the end
    Tail,
}

/// Configuration for the résumé pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Model context window, prompt plus completion (tokens)
    pub context_window_tokens: usize,

    /// Tokens kept free for the completion
    pub reserved_completion_tokens: usize,

    /// Tokens charged for the constant prompt text
    pub instruction_token_estimate: usize,

    /// Which part of an oversized document survives truncation
    pub truncation: TruncationPolicy,

    /// Largest document accepted for extraction (bytes)
    pub max_document_bytes: usize,

    /// Sampling parameters sent with every completion
    pub generation: GenerationParams,
}

impl ExtractorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.context_window_tokens == 0 {
            return Err("context_window_tokens must be greater than 0".to_string());
        }
        let fixed = self
            .reserved_completion_tokens
            .checked_add(self.instruction_token_estimate)
            .ok_or_else(|| {
                "reserved_completion_tokens + instruction_token_estimate overflows".to_string()
            })?;
        if fixed >= self.context_window_tokens {
            return Err(format!(
                "reserved_completion_tokens + instruction_token_estimate ({}) must be less than context_window_tokens ({})",
                fixed, self.context_window_tokens
            ));
        }
        if self.instruction_token_estimate < PromptBuilder::fixed_token_estimate() {
            return Err(format!(
                "instruction_token_estimate must be at least {} (size of the fixed prompt text)",
                PromptBuilder::fixed_token_estimate()
            ));
        }
        if self.generation.max_tokens as usize > self.reserved_completion_tokens {
            return Err("generation.max_tokens cannot exceed reserved_completion_tokens".to_string());
        }
        if self.max_document_bytes == 0 {
            return Err("max_document_bytes must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    /// Defaults for a 1B-class instruct model with an 8K context
    fn default() -> Self {
        Self {
            context_window_tokens: 8192,
            reserved_completion_tokens: 3096,
            instruction_token_estimate: 512,
            truncation: TruncationPolicy::Head,
            max_document_bytes: 10 * 1024 * 1024,
            generation: GenerationParams::default(),
        }
    }
}

impl ExtractorConfig {
    /// Compact preset: 4K context, shorter completions
    pub fn compact() -> Self {
        Self {
            context_window_tokens: 4096,
            reserved_completion_tokens: 1536,
            generation: GenerationParams {
                max_tokens: 1536,
                ..GenerationParams::default()
            },
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str)
            .map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
