//! Configuration management for the CLI.
//!
//! Reads the same TOML layout as the server: `[completion]` and
//! `[extractor]` tables, plus an optional CLI-only `[settings]` table.
//! Keys the CLI does not know (such as `bind_port`) are ignored.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use vitae_extractor::ExtractorConfig;
use vitae_llm::CompletionConfig;

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Completion service settings
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Pipeline settings
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Output settings
    #[serde(default)]
    pub settings: Settings,
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable summary
    Summary,
    /// Full JSON report
    Json,
    /// Bare record JSON
    Quiet,
}

impl Config {
    /// Load configuration from `path`, or use defaults when none is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let contents = fs::read_to_string(path)?;
                toml::from_str(&contents)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the completion and extractor settings
    pub fn validate(&self) -> Result<()> {
        self.completion
            .validate()
            .map_err(|e| CliError::Config(format!("completion: {}", e)))?;
        self.extractor
            .validate()
            .map_err(|e| CliError::Config(format!("extractor: {}", e)))?;
        Ok(())
    }

    /// Configuration with the small-context extractor preset
    pub fn compact() -> Self {
        Self {
            extractor: ExtractorConfig::compact(),
            ..Self::default()
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Summary,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Summary
}
