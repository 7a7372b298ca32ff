//! Vitae Extractor
//!
//! Turns résumé documents (PDF, DOCX) into structured records using a local
//! text-completion model.
//!
//! # Architecture
//!
//! ```text
//! bytes → DocumentTextExtractor → normalized text → PromptBuilder → prompt
//!       → CompletionPool → completion → ResponseDecoder → DecodeOutcome
//! ```
//!
//! # Key Features
//!
//! - **Text extraction**: PDF pages and DOCX paragraphs, in document order
//! - **Token budgeting**: the document is truncated, never the instructions
//! - **Robust decoding**: string-aware brace scanning, a single syntax
//!   repair pass, schema coercion, and regex recovery of email and phone
//! - **Explicit outcomes**: `Decoded`, `Repaired` (with low-confidence
//!   fields), or `Undecodable` (with the raw text and a reason)
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use vitae_domain::RawDocument;
//! use vitae_extractor::{ExtractorConfig, ResumeParser};
//! use vitae_llm::{CompletionPool, OllamaProvider, PoolConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = OllamaProvider::default_endpoint("llama3.2:1b").with_context_window(8192);
//! let pool = Arc::new(CompletionPool::single(provider, PoolConfig::default()));
//! let parser = ResumeParser::new(pool, ExtractorConfig::default())?;
//!
//! let bytes = std::fs::read("resume.pdf")?;
//! let report = parser.parse(RawDocument::from_filename("resume.pdf", bytes)).await?;
//!
//! println!("{}: {:?}", report.outcome.label(), report.outcome.resume());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod decoder;
mod document;
mod error;
mod extractor;
mod fallback;
mod normalize;
mod prompt;
mod repair;


pub use config::{ExtractorConfig, TruncationPolicy};
pub use decoder::{decode, decode_with_source};
pub use document::DocumentTextExtractor;
pub use error::ExtractorError;
pub use extractor::{ParseReport, ResumeParser};
pub use fallback::extract as extract_contact_hints;
pub use normalize::normalize;
pub use prompt::{estimate_tokens, Prompt, PromptBudget, PromptBuilder, CHARS_PER_TOKEN};
pub use repair::{repair as repair_json, scan_objects, ObjectScan};
