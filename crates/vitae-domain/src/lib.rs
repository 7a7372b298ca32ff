//! Vitae Domain Layer
//!
//! This crate contains the data model shared by every other Vitae crate:
//! the documents that come in, the structured résumé record that goes out,
//! and the trait boundary to the generative completion service.
//!
//! ## Key Concepts
//!
//! - **RawDocument**: uploaded bytes plus the format the caller declared
//! - **ExtractedText**: normalized plain text pulled out of a document
//! - **ParsedResume**: the structured record (contact, experience, skills, education)
//! - **Completion**: free-form text returned by the completion service
//! - **DecodeOutcome**: Decoded, Repaired, or Undecodable
//!
//! ## Architecture
//!
//! - Pure data and trait definitions only
//! - Infrastructure implementations live in other crates
//!   (`vitae-llm` for providers, `vitae-extractor` for the pipeline)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod completion;
pub mod document;
pub mod outcome;
pub mod resume;
pub mod traits;

// Re-exports for convenience
pub use completion::{
    Completion, CompletionRequest, CompletionResponse, FinishReason, GenerationParams,
};
pub use document::{DocumentFormat, ExtractedText, RawDocument};
pub use outcome::{ContactHints, DecodeOutcome, FieldPath, Repair, UndecodableReason};
pub use resume::{Contact, Education, Experience, ParsedResume};
pub use traits::CompletionProvider;
