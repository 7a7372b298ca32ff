//! Input documents and the text extracted from them

use serde::{Deserialize, Serialize};
use std::fmt;

/// Document formats the pipeline can read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Portable Document Format
    Pdf,
    /// Office Open XML word-processing document
    Docx,
}

impl DocumentFormat {
    /// Resolve a declared format label (`"pdf"`, `".DOCX"`, ...)
    ///
    /// Returns `None` for anything that is not PDF or DOCX.
    ///
    /// # Examples
    ///
    /// ```
    /// use vitae_domain::DocumentFormat;
    ///
    /// assert_eq!(DocumentFormat::parse("PDF"), Some(DocumentFormat::Pdf));
    /// assert_eq!(DocumentFormat::parse(".docx"), Some(DocumentFormat::Docx));
    /// assert_eq!(DocumentFormat::parse("txt"), None);
    /// ```
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim().trim_start_matches('.');
        if label.eq_ignore_ascii_case("pdf") {
            Some(DocumentFormat::Pdf)
        } else if label.eq_ignore_ascii_case("docx") {
            Some(DocumentFormat::Docx)
        } else {
            None
        }
    }

    /// Canonical lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uploaded document, as received
///
/// The declared format is kept as the caller's label rather than a
/// [`DocumentFormat`] so that unsupported labels can be rejected with a
/// precise error by the extractor.
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// Document contents
    pub bytes: Vec<u8>,

    /// Format label supplied by the caller (usually the file extension)
    pub declared_format: String,
}

impl RawDocument {
    /// Create a document with an explicit format label
    pub fn new(bytes: impl Into<Vec<u8>>, declared_format: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            declared_format: declared_format.into(),
        }
    }

    /// Create a document whose format label is the file name's extension
    ///
    /// A name without an extension yields an empty label, which the
    /// extractor rejects as unsupported.
    ///
    /// # Examples
    ///
    /// ```
    /// use vitae_domain::RawDocument;
    ///
    /// let doc = RawDocument::from_filename("Jane_Doe.PDF", vec![]);
    /// assert_eq!(doc.declared_format, "pdf");
    /// ```
    pub fn from_filename(file_name: &str, bytes: impl Into<Vec<u8>>) -> Self {
        let extension = std::path::Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        Self::new(bytes, extension)
    }

    /// Resolve the declared label to a supported format
    pub fn format(&self) -> Option<DocumentFormat> {
        DocumentFormat::parse(&self.declared_format)
    }
}

/// Normalized plain text extracted from a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    /// Normalized text
    pub text: String,

    /// Format the text came from
    pub format: DocumentFormat,

    /// True when at least one page or paragraph yielded no text
    pub has_empty_segments: bool,
}

impl ExtractedText {
    /// Create extracted text
    pub fn new(text: impl Into<String>, format: DocumentFormat, has_empty_segments: bool) -> Self {
        Self {
            text: text.into(),
            format,
            has_empty_segments,
        }
    }

    /// True when the text has no non-whitespace characters
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Length in characters (not bytes)
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}
