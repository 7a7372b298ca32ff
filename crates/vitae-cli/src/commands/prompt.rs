//! Prompt command implementation.

use super::text::extract;
use crate::cli::DocumentArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use vitae_extractor::PromptBuilder;

/// Execute the prompt command.
///
/// Builds the exact prompt `parse` would send, without contacting a model.
pub async fn execute_prompt(args: DocumentArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let text = extract(&args, config).await?;
    let prompt = PromptBuilder::from_config(&config.extractor).build(&text)?;

    println!("{}", formatter.format_prompt(&prompt)?);

    eprintln!(
        "{}",
        formatter.info(&format!(
            "~{} tokens; input budget {} tokens of a {} token window",
            prompt.token_estimate(),
            prompt.declared_token_budget(),
            config.extractor.context_window_tokens
        ))
    );
    if prompt.truncated() {
        eprintln!(
            "{}",
            formatter.warning(&format!(
                "Document truncated from ~{} tokens",
                prompt.original_token_estimate()
            ))
        );
    }
    Ok(())
}
