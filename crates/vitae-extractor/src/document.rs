//! Plain text from PDF and DOCX documents
//!
//! Each format yields a list of segments (pages for PDF, paragraphs for
//! DOCX) in document order. Segments are joined with newlines and the result
//! is normalized; a document whose normalized text is blank is rejected so
//! nothing downstream ever prompts on empty input.

use crate::error::ExtractorError;
use crate::normalize::normalize;
use regex::Regex;
use std::io::{Cursor, Read};
use std::panic::{self, AssertUnwindSafe};
use std::sync::LazyLock;
use tracing::{debug, warn};
use vitae_domain::{DocumentFormat, ExtractedText, RawDocument};
use zip::ZipArchive;

/// Path of the main body part inside a DOCX container
const DOCX_BODY: &str = "word/document.xml";

/// How far the DOCX body may expand past the document size limit
const DOCX_EXPANSION_LIMIT: usize = 8;

static DOCX_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"<w:p(?:\s[^>]*)?/>|<w:p(?:\s[^>]*)?>|</w:p>|<w:t(?:\s[^>]*)?>([^<]*)</w:t>|<w:tab/>|<w:(?:br|cr)(?:\s[^>]*)?/>",
    )
    .expect("docx token pattern should compile")
});

/// Extracts normalized text from raw documents
#[derive(Debug, Clone)]
pub struct DocumentTextExtractor {
    max_document_bytes: usize,
}

impl DocumentTextExtractor {
    /// Create an extractor that rejects documents over `max_document_bytes`
    pub fn new(max_document_bytes: usize) -> Self {
        Self { max_document_bytes }
    }

    /// Extract normalized text
    ///
    /// # Errors
    ///
    /// - [`ExtractorError::UnsupportedFormat`] unless the declared format is PDF or DOCX
    /// - [`ExtractorError::Extraction`] if the document is too large or cannot be read
    /// - [`ExtractorError::EmptyDocument`] if no text remains after normalization
    pub fn extract(&self, document: &RawDocument) -> Result<ExtractedText, ExtractorError> {
        let format = document
            .format()
            .ok_or_else(|| ExtractorError::UnsupportedFormat(document.declared_format.clone()))?;

        if document.bytes.len() > self.max_document_bytes {
            return Err(ExtractorError::Extraction(format!(
                "document is {} bytes (max: {})",
                document.bytes.len(),
                self.max_document_bytes
            )));
        }

        let segments = match format {
            DocumentFormat::Pdf => pdf_pages(&document.bytes)?,
            DocumentFormat::Docx => docx_paragraphs(
                &document.bytes,
                self.max_document_bytes.saturating_mul(DOCX_EXPANSION_LIMIT),
            )?,
        };

        assemble(segments, format)
    }
}

impl Default for DocumentTextExtractor {
    fn default() -> Self {
        Self::new(10 * 1024 * 1024)
    }
}

/// Join segments, normalize, and reject blank documents
fn assemble(segments: Vec<String>, format: DocumentFormat) -> Result<ExtractedText, ExtractorError> {
    let total = segments.len();
    let empty = segments.iter().filter(|s| s.trim().is_empty()).count();
    if empty > 0 {
        debug!("{} of {} {} segments had no text", empty, total, format);
    }

    let joined = segments
        .iter()
        .filter(|s| !s.trim().is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n");
    let text = normalize(&joined);

    if text.is_empty() {
        warn!("{} document with {} segments has no extractable text", format, total);
        return Err(ExtractorError::EmptyDocument);
    }

    Ok(ExtractedText::new(text, format, empty > 0))
}

/// Text of each PDF page, in page order
fn pdf_pages(bytes: &[u8]) -> Result<Vec<String>, ExtractorError> {
    // pdf-extract panics on some malformed inputs
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }));

    match result {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(ExtractorError::Extraction(format!("Failed to read PDF: {}", e))),
        Err(_) => Err(ExtractorError::Extraction(
            "Failed to read PDF: parser aborted on malformed input".to_string(),
        )),
    }
}

/// Text of each DOCX body paragraph, in document order
///
/// The body is decompressed up to `max_body_bytes`; anything larger is
/// rejected rather than inflated.
fn docx_paragraphs(bytes: &[u8], max_body_bytes: usize) -> Result<Vec<String>, ExtractorError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractorError::Extraction(format!("Invalid DOCX container: {}", e)))?;

    let mut body = archive
        .by_name(DOCX_BODY)
        .map_err(|_| ExtractorError::Extraction(format!("DOCX has no {}", DOCX_BODY)))?;

    let limit = u64::try_from(max_body_bytes).unwrap_or(u64::MAX);
    let too_large = || {
        ExtractorError::Extraction(format!(
            "{} expands past {} bytes",
            DOCX_BODY, max_body_bytes
        ))
    };
    if body.size() > limit {
        return Err(too_large());
    }

    // The declared size can lie, so the read itself is bounded too
    let mut xml = String::new();
    (&mut body)
        .take(limit.saturating_add(1))
        .read_to_string(&mut xml)
        .map_err(|e| ExtractorError::Extraction(format!("Failed to read {}: {}", DOCX_BODY, e)))?;
    if xml.len() > max_body_bytes {
        return Err(too_large());
    }

    Ok(paragraphs_from_xml(&xml))
}

/// Walk `w:p` paragraphs (including those in table cells) collecting run text
fn paragraphs_from_xml(xml: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;

    for token in DOCX_TOKEN.captures_iter(xml) {
        let whole = token.get(0).map_or("", |m| m.as_str());

        if let Some(text) = token.get(1) {
            current
                .get_or_insert_with(String::new)
                .push_str(&unescape_xml(text.as_str()));
        } else if whole == "</w:p>" {
            paragraphs.push(current.take().unwrap_or_default());
        } else if whole.ends_with("/>") && whole.starts_with("<w:p") {
            paragraphs.push(String::new());
        } else if whole.starts_with("<w:p") {
            if let Some(open) = current.take() {
                paragraphs.push(open);
            }
            current = Some(String::new());
        } else if whole == "<w:tab/>" {
            current.get_or_insert_with(String::new).push('\t');
        } else {
            current.get_or_insert_with(String::new).push('\n');
        }
    }

    if let Some(open) = current {
        paragraphs.push(open);
    }
    paragraphs
}

/// Decode the predefined XML entities and numeric character references
fn unescape_xml(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest.find(';').and_then(|semi| {
            let entity = &rest[1..semi];
            let c = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            c.map(|c| (c, semi))
        });

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
