//! Decode command implementation.

use crate::cli::DecodeArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use std::fs;
use vitae_domain::{Completion, DecodeOutcome};
use vitae_extractor::decode_with_source;

/// Execute the decode command.
///
/// Runs the response decoder over saved model output, optionally using the
/// source document's text (plain text, not PDF or DOCX) to fill a missing
/// email or phone.
pub async fn execute_decode(args: DecodeArgs, formatter: &Formatter) -> Result<()> {
    let outcome = decode_files(&args)?;
    println!("{}", formatter.format_outcome(&outcome)?);

    match outcome {
        DecodeOutcome::Undecodable { reason, .. } => Err(CliError::Undecodable(reason)),
        _ => Ok(()),
    }
}

fn decode_files(args: &DecodeArgs) -> Result<DecodeOutcome> {
    let raw_text = fs::read_to_string(&args.completion)?;
    let source = args.source.as_ref().map(fs::read_to_string).transpose()?;

    Ok(decode_with_source(&Completion::new(raw_text), source.as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_decode_saved_output_with_source() {
        let dir = tempfile::tempdir().unwrap();
        let completion = write(
            &dir,
            "out.txt",
            "Here you go:\n```json\n{\"contact\": {\"name\": \"Jane\", \"email\": null}, \"skills\": [\"Go\"],}\n```",
        );
        let source = write(&dir, "cv.txt", "Jane\njane@x.com");

        let outcome = decode_files(&DecodeArgs {
            completion,
            source: Some(source),
        })
        .unwrap();

        let resume = outcome.resume().unwrap();
        assert_eq!(resume.contact.email.as_deref(), Some("jane@x.com"));
        assert_eq!(resume.skills, vec!["Go"]);
    }

    #[tokio::test]
    async fn test_undecodable_output_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let completion = write(&dir, "out.txt", "I cannot help with that.");

        let formatter = Formatter::new(crate::config::OutputFormat::Summary, false);
        let result = execute_decode(
            DecodeArgs {
                completion,
                source: None,
            },
            &formatter,
        )
        .await;
        assert!(matches!(result, Err(CliError::Undecodable(_))));
    }
}
