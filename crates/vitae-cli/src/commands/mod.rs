//! Command implementations.

pub mod decode;
pub mod init;
pub mod parse;
pub mod prompt;
pub mod text;

pub use self::decode::execute_decode;
pub use self::init::execute_init;
pub use self::parse::execute_parse;
pub use self::prompt::execute_prompt;
pub use self::text::execute_text;

use crate::error::{CliError, Result};
use std::path::Path;
use vitae_domain::RawDocument;

/// Read a document, taking its format from the file extension
pub(crate) fn read_document(path: &Path) -> Result<RawDocument> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| CliError::InvalidInput(format!("Not a file path: {}", path.display())))?;
    let bytes = std::fs::read(path)?;
    Ok(RawDocument::from_filename(file_name, bytes))
}
