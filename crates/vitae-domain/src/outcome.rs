//! Decode outcomes
//!
//! Every attempt to recover a [`ParsedResume`] from completion text yields
//! exactly one [`DecodeOutcome`]. `Undecodable` is an ordinary result, not
//! an error: it carries the raw text and the reason so callers can report it.

use crate::resume::ParsedResume;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Dotted path to a field of [`ParsedResume`] (e.g. `contact.email`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(String);

impl FieldPath {
    /// Path to a top-level section
    pub fn section(name: &str) -> Self {
        Self(name.to_string())
    }

    /// Path to a field nested in a section
    pub fn nested(section: &str, field: &str) -> Self {
        Self(format!("{}.{}", section, field))
    }

    /// The dotted path
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        Self(path.to_string())
    }
}

/// A change the decoder made to get from completion text to a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "field", rename_all = "snake_case")]
pub enum Repair {
    /// The JSON needed the syntax repair pass before it parsed
    SyntaxRepaired,
    /// A single value was wrapped into the sequence the schema expects
    Coerced(FieldPath),
    /// A null contact field was filled by the regex fallback
    ContactFilled(FieldPath),
}

/// Why completion text could not be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UndecodableReason {
    /// No `{` anywhere in the text
    NoJsonObject,
    /// A JSON-like region exists but did not parse, even after repair
    MalformedJson,
    /// Parsed, but none of the résumé sections are present
    SchemaMismatch,
}

impl UndecodableReason {
    /// Stable kebab-case label
    pub fn as_str(&self) -> &'static str {
        match self {
            UndecodableReason::NoJsonObject => "no-json-object",
            UndecodableReason::MalformedJson => "malformed-json",
            UndecodableReason::SchemaMismatch => "schema-mismatch",
        }
    }
}

impl fmt::Display for UndecodableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contact fields recovered by pattern matching
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactHints {
    /// First email address found
    pub email: Option<String>,
    /// First phone number found
    pub phone: Option<String>,
}

impl ContactHints {
    /// True when neither field was found
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.phone.is_none()
    }
}

/// Result of decoding one completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DecodeOutcome {
    /// Well-formed output matching the schema, used as-is
    Decoded(ParsedResume),

    /// Usable record, but some fields were missing or had to be repaired
    Repaired {
        /// The recovered record
        resume: ParsedResume,
        /// Schema fields absent from the completion
        missing_fields: BTreeSet<FieldPath>,
        /// Changes made while decoding
        repairs: Vec<Repair>,
    },

    /// No usable record could be recovered
    Undecodable {
        /// The completion text, unmodified
        raw_text: String,
        /// Why decoding failed
        reason: UndecodableReason,
        /// Contact fields the regex fallback still found
        salvaged_contact: ContactHints,
    },
}

impl DecodeOutcome {
    /// The recovered record, if any
    pub fn resume(&self) -> Option<&ParsedResume> {
        match self {
            DecodeOutcome::Decoded(resume) => Some(resume),
            DecodeOutcome::Repaired { resume, .. } => Some(resume),
            DecodeOutcome::Undecodable { .. } => None,
        }
    }

    /// Consume the outcome, returning the record if any
    pub fn into_resume(self) -> Option<ParsedResume> {
        match self {
            DecodeOutcome::Decoded(resume) => Some(resume),
            DecodeOutcome::Repaired { resume, .. } => Some(resume),
            DecodeOutcome::Undecodable { .. } => None,
        }
    }

    /// True for `Decoded` and `Repaired`
    pub fn is_usable(&self) -> bool {
        self.resume().is_some()
    }

    /// Fields that should be treated as lower confidence
    ///
    /// The union of missing fields and fields touched by a repair, in path
    /// order. Empty for `Decoded` and `Undecodable`.
    pub fn low_confidence_fields(&self) -> Vec<FieldPath> {
        match self {
            DecodeOutcome::Repaired {
                missing_fields,
                repairs,
                ..
            } => {
                let mut fields = missing_fields.clone();
                for repair in repairs {
                    match repair {
                        Repair::Coerced(path) | Repair::ContactFilled(path) => {
                            fields.insert(path.clone());
                        }
                        Repair::SyntaxRepaired => {}
                    }
                }
                fields.into_iter().collect()
            }
            _ => Vec::new(),
        }
    }

    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            DecodeOutcome::Decoded(_) => "decoded",
            DecodeOutcome::Repaired { .. } => "repaired",
            DecodeOutcome::Undecodable { .. } => "undecodable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_path_display() {
        assert_eq!(FieldPath::section("skills").to_string(), "skills");
        assert_eq!(FieldPath::nested("contact", "email").as_str(), "contact.email");
    }

    #[test]
    fn test_low_confidence_fields_merges_repairs() {
        let mut missing = BTreeSet::new();
        missing.insert(FieldPath::section("education"));

        let outcome = DecodeOutcome::Repaired {
            resume: ParsedResume::default(),
            missing_fields: missing,
            repairs: vec![
                Repair::SyntaxRepaired,
                Repair::ContactFilled(FieldPath::nested("contact", "phone")),
                Repair::Coerced(FieldPath::section("education")),
            ],
        };

        let fields: Vec<String> = outcome
            .low_confidence_fields()
            .into_iter()
            .map(|f| f.to_string())
            .collect();
        assert_eq!(fields, vec!["contact.phone", "education"]);
    }

    #[test]
    fn test_undecodable_has_no_resume() {
        let outcome = DecodeOutcome::Undecodable {
            raw_text: "nope".to_string(),
            reason: UndecodableReason::MalformedJson,
            salvaged_contact: ContactHints::default(),
        };
        assert!(!outcome.is_usable());
        assert!(outcome.low_confidence_fields().is_empty());
        assert_eq!(outcome.label(), "undecodable");
    }

    #[test]
    fn test_reason_labels() {
        assert_eq!(UndecodableReason::MalformedJson.as_str(), "malformed-json");
        let json = serde_json::to_string(&UndecodableReason::NoJsonObject).unwrap();
        assert_eq!(json, "\"no-json-object\"");
    }

    #[test]
    fn test_outcome_serializes_tagged() {
        let outcome = DecodeOutcome::Decoded(ParsedResume::default());
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["outcome"], "decoded");
        assert!(value["contact"].is_object());
    }
}
