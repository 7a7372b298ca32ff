//! Parse command implementation.

use super::read_document;
use crate::cli::ParseArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use std::sync::Arc;
use tracing::info;
use vitae_domain::DecodeOutcome;
use vitae_extractor::ResumeParser;
use vitae_llm::{CompletionConfig, CompletionPool};

/// Execute the parse command.
pub async fn execute_parse(args: ParseArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let completion = completion_settings(&args, &config.completion);
    completion.validate().map_err(CliError::Config)?;

    let document = read_document(&args.file)?;

    info!(
        "Using {:?} backend, model '{}'",
        completion.backend, completion.model
    );
    let backends = completion.backends(config.extractor.context_window_tokens);
    let pool = CompletionPool::new(backends, completion.pool.clone())
        .map_err(|e| CliError::Config(e.to_string()))?;
    let parser = ResumeParser::new(Arc::new(pool), config.extractor.clone())?;

    let report = parser.parse(document).await?;
    println!("{}", formatter.format_report(&report)?);

    match report.outcome {
        DecodeOutcome::Undecodable { reason, .. } => Err(CliError::Undecodable(reason)),
        _ => Ok(()),
    }
}

/// Apply command-line overrides to the configured completion settings
fn completion_settings(args: &ParseArgs, configured: &CompletionConfig) -> CompletionConfig {
    let mut completion = configured.clone();
    if let Some(backend) = args.backend {
        completion.backend = backend.into();
    }
    if let Some(model) = &args.model {
        completion.model = model.clone();
    }
    if !args.endpoint.is_empty() {
        completion.endpoints = args.endpoint.clone();
    }
    if let Some(timeout) = args.timeout {
        completion.pool.timeout_secs = timeout;
    }
    completion
}
