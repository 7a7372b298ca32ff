//! Text normalization
//!
//! Shared by the document extractors (on extracted text) and the decoder
//! (on completion text).

use regex::Regex;
use std::sync::LazyLock;

static EMPTY_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```\s*```").expect("fence pattern should compile"));

/// Normalize whitespace and line structure
///
/// - CRLF and lone CR become LF
/// - empty fenced code blocks are removed (repeatedly, until none remain)
/// - trailing whitespace is removed from every line
/// - runs of blank lines collapse to a single blank line
/// - leading and trailing whitespace is trimmed
///
/// Total and idempotent.
pub fn normalize(text: &str) -> String {
    let mut text = text.replace("\r\n", "\n").replace('\r', "\n");

    while EMPTY_FENCE.is_match(&text) {
        text = EMPTY_FENCE.replace_all(&text, "").into_owned();
    }

    let mut out = String::with_capacity(text.len());
    let mut pending_blank = false;
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            pending_blank = true;
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
            if pending_blank {
                out.push('\n');
            }
        }
        pending_blank = false;
        out.push_str(line);
    }

    out.trim().to_string()
}
