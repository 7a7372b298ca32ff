//! Text command implementation.

use super::read_document;
use crate::cli::DocumentArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use vitae_domain::ExtractedText;
use vitae_extractor::DocumentTextExtractor;

/// Execute the text command.
pub async fn execute_text(args: DocumentArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let text = extract(&args, config).await?;
    println!("{}", formatter.format_text(&text)?);

    if text.has_empty_segments {
        eprintln!("{}", formatter.warning("Some pages or paragraphs had no text"));
    }
    Ok(())
}

/// Read and extract a document off the async runtime
pub(crate) async fn extract(args: &DocumentArgs, config: &Config) -> Result<ExtractedText> {
    let document = read_document(&args.file)?;
    let extractor = DocumentTextExtractor::new(config.extractor.max_document_bytes);

    let text = tokio::task::spawn_blocking(move || extractor.extract(&document))
        .await
        .map_err(|e| CliError::InvalidInput(format!("Extraction task failed: {}", e)))??;
    Ok(text)
}
