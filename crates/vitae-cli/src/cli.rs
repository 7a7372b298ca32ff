//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vitae_llm::BackendKind;

/// Vitae CLI - Extract structured résumé data with a local language model.
#[derive(Debug, Parser)]
#[command(name = "vitae")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path (the server's config file works too)
    #[arg(short, long, global = true, env = "VITAE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log progress to stderr (repeat for debug output)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Human-readable summary (default)
    Summary,
    /// Full JSON report
    Json,
    /// Bare record JSON only
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse a résumé into a structured record
    Parse(ParseArgs),

    /// Print the normalized text extracted from a document
    Text(DocumentArgs),

    /// Print the prompt that would be sent, without calling the model
    Prompt(DocumentArgs),

    /// Decode saved model output
    Decode(DecodeArgs),

    /// Write a default configuration file
    Init(InitArgs),
}

/// Arguments for the parse command.
#[derive(Debug, Parser)]
pub struct ParseArgs {
    /// PDF or DOCX file
    pub file: PathBuf,

    /// Completion backend
    #[arg(short, long, value_enum)]
    pub backend: Option<BackendArg>,

    /// Model name
    #[arg(short, long, env = "VITAE_MODEL")]
    pub model: Option<String>,

    /// Completion service URL (repeat for several instances)
    #[arg(short, long)]
    pub endpoint: Vec<String>,

    /// Per-attempt timeout in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,
}

/// Arguments for commands that only read a document.
#[derive(Debug, Parser)]
pub struct DocumentArgs {
    /// PDF or DOCX file
    pub file: PathBuf,
}

/// Arguments for the decode command.
#[derive(Debug, Parser)]
pub struct DecodeArgs {
    /// File holding the model's raw output
    pub completion: PathBuf,

    /// Source document, used to recover missing email and phone
    #[arg(short, long)]
    pub source: Option<PathBuf>,
}

/// Arguments for the init command.
#[derive(Debug, Parser)]
pub struct InitArgs {
    /// Where to write the file
    #[arg(default_value = "vitae.toml")]
    pub path: PathBuf,

    /// Use the small-context preset
    #[arg(long)]
    pub compact: bool,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Backend argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum BackendArg {
    /// Ollama
    Ollama,
    /// llama.cpp server
    Llamacpp,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Summary => crate::config::OutputFormat::Summary,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<BackendArg> for BackendKind {
    fn from(backend: BackendArg) -> Self {
        match backend {
            BackendArg::Ollama => BackendKind::Ollama,
            BackendArg::Llamacpp => BackendKind::LlamaCpp,
        }
    }
}
