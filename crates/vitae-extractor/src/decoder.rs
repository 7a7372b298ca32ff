//! Decoding completion text into a [`ParsedResume`]
//!
//! Every completion maps to exactly one [`DecodeOutcome`]:
//!
//! 1. Locate JSON object candidates with the string-aware brace scanner. The
//!    first one that parses and holds a résumé section wins, else the first
//!    one that parses at all.
//! 2. If no candidate holds a résumé section, repair the first candidate that
//!    does not parse and try it once more.
//! 3. Map the object onto the schema, coercing near-misses (a single object
//!    where a list is expected, a comma-separated skills string) and noting
//!    absent fields.
//! 4. Fill null email/phone from the regex fallback, first from the
//!    completion text, then from the source document if supplied.
//!
//! Decoding never panics and never returns a bare string.

use crate::fallback;
use crate::normalize::normalize;
use crate::repair::{repair, scan_objects, ObjectScan};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::{debug, warn};
use vitae_domain::{
    Completion, Contact, ContactHints, DecodeOutcome, Education, Experience, FieldPath,
    ParsedResume, Repair, UndecodableReason,
};

type Object = Map<String, Value>;

/// Decode a completion
pub fn decode(completion: &Completion) -> DecodeOutcome {
    decode_with_source(completion, None)
}

/// Decode a completion, using `source` as a second fallback for contact fields
pub fn decode_with_source(completion: &Completion, source: Option<&str>) -> DecodeOutcome {
    if completion.hit_token_limit() {
        warn!("Completion stopped at the token limit; output may be cut off");
    }

    let normalized = normalize(&completion.raw_text);
    let scan = scan_objects(&normalized);

    let mut repairs = Vec::new();
    let object = match select_object(&scan) {
        Some(object) if holds_record(&object) => object,
        parsed => match repair_first_unparsed(&scan) {
            Some(repaired) if parsed.is_none() || holds_record(&repaired) => {
                debug!("Completion parsed after syntax repair");
                repairs.push(Repair::SyntaxRepaired);
                repaired
            }
            _ => match parsed {
                Some(object) => object,
                None if scan.is_empty() => {
                    return undecodable(completion, source, UndecodableReason::NoJsonObject)
                }
                None => return undecodable(completion, source, UndecodableReason::MalformedJson),
            },
        },
    };

    if !holds_record(&object) {
        return undecodable(completion, source, UndecodableReason::SchemaMismatch);
    }
    let root = schema_root(object);

    let mut missing = BTreeSet::new();
    let mut resume = ParsedResume {
        contact: contact_section(&root, &mut missing, &mut repairs),
        experience: entry_section(&root, "experience", experience_entry, &mut missing, &mut repairs),
        skills: skills_section(&root, &mut missing, &mut repairs),
        education: entry_section(&root, "education", education_entry, &mut missing, &mut repairs),
    };

    let removed = resume.enforce_invariants();
    if removed > 0 {
        debug!("Dropped {} duplicate or empty items", removed);
    }

    fill_contact(&mut resume.contact, &completion.raw_text, source, &mut repairs);

    if missing.is_empty() && repairs.is_empty() {
        DecodeOutcome::Decoded(resume)
    } else {
        DecodeOutcome::Repaired {
            resume,
            missing_fields: missing,
            repairs,
        }
    }
}

fn parse_object(text: &str) -> Option<Object> {
    match serde_json::from_str(text) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

/// The first candidate holding a résumé section, else the first that parses
fn select_object(scan: &ObjectScan<'_>) -> Option<Object> {
    let mut first = None;
    for object in scan.candidates().filter_map(parse_object) {
        if holds_record(&object) {
            return Some(object);
        }
        first.get_or_insert(object);
    }
    first
}

/// Repair the first candidate that does not parse as it stands
fn repair_first_unparsed(scan: &ObjectScan<'_>) -> Option<Object> {
    let candidate = scan.candidates().find(|c| parse_object(c).is_none())?;
    parse_object(&repair(candidate))
}

/// True when the object, or its `data` wrapper, has any résumé section
fn holds_record(object: &Object) -> bool {
    has_section(object) || matches!(object.get("data"), Some(Value::Object(data)) if has_section(data))
}

fn has_section(object: &Object) -> bool {
    ParsedResume::SECTIONS.iter().any(|s| object.contains_key(*s))
}

fn undecodable(
    completion: &Completion,
    source: Option<&str>,
    reason: UndecodableReason,
) -> DecodeOutcome {
    warn!("Completion undecodable: {}", reason);

    let mut salvaged = fallback::extract(&completion.raw_text);
    if let Some(source) = source {
        let from_source = fallback::extract(source);
        salvaged.email = salvaged.email.or(from_source.email);
        salvaged.phone = salvaged.phone.or(from_source.phone);
    }

    DecodeOutcome::Undecodable {
        raw_text: completion.raw_text.clone(),
        reason,
        salvaged_contact: salvaged,
    }
}

/// The `data` wrapper if it holds the record, otherwise the top level
fn schema_root(mut object: Object) -> Object {
    let wrapped = matches!(object.get("data"), Some(Value::Object(data)) if has_section(data));
    if wrapped {
        if let Some(Value::Object(data)) = object.remove("data") {
            return data;
        }
    }
    object
}

/// Render a JSON value as an optional string field
///
/// Numbers and booleans are stringified, string arrays joined with `"; "`,
/// and blank strings become `None`.
fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => join(items.iter().filter_map(text_value), "; "),
        Value::Object(map) => join(map.values().filter_map(text_value), ", "),
    }
}

fn join(parts: impl Iterator<Item = String>, separator: &str) -> Option<String> {
    let parts: Vec<String> = parts.collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(separator))
    }
}

fn field(object: &Object, key: &str) -> Option<String> {
    object.get(key).and_then(text_value)
}

fn contact_section(
    root: &Object,
    missing: &mut BTreeSet<FieldPath>,
    repairs: &mut Vec<Repair>,
) -> Contact {
    let object = match root.get("contact") {
        None => {
            missing.insert(FieldPath::section("contact"));
            return Contact::default();
        }
        Some(Value::Object(object)) => object,
        Some(Value::Array(items)) => {
            repairs.push(Repair::Coerced(FieldPath::section("contact")));
            match items.iter().find_map(Value::as_object) {
                Some(object) => object,
                None => return Contact::default(),
            }
        }
        Some(Value::Null) => return Contact::default(),
        Some(_) => {
            missing.insert(FieldPath::section("contact"));
            return Contact::default();
        }
    };

    for key in Contact::FIELDS {
        if !object.contains_key(key) {
            missing.insert(FieldPath::nested("contact", key));
        }
    }

    Contact {
        name: field(object, "name"),
        email: field(object, "email"),
        phone: field(object, "phone"),
        location: field(object, "location"),
        linkedin: field(object, "linkedin"),
    }
}

fn experience_entry(object: &Object) -> Experience {
    Experience {
        company: field(object, "company"),
        title: field(object, "title"),
        start_date: field(object, "start_date"),
        end_date: field(object, "end_date"),
        location: field(object, "location"),
        description: field(object, "description"),
    }
}

fn education_entry(object: &Object) -> Education {
    Education {
        institution: field(object, "institution"),
        degree: field(object, "degree"),
        start_date: field(object, "start_date"),
        end_date: field(object, "end_date"),
        location: field(object, "location"),
    }
}

/// A list-of-objects section; a single object is wrapped into a list
fn entry_section<T>(
    root: &Object,
    section: &str,
    entry: fn(&Object) -> T,
    missing: &mut BTreeSet<FieldPath>,
    repairs: &mut Vec<Repair>,
) -> Vec<T> {
    match root.get(section) {
        None => {
            missing.insert(FieldPath::section(section));
            Vec::new()
        }
        Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_object).map(entry).collect(),
        Some(Value::Object(object)) => {
            repairs.push(Repair::Coerced(FieldPath::section(section)));
            vec![entry(object)]
        }
        Some(_) => {
            missing.insert(FieldPath::section(section));
            Vec::new()
        }
    }
}

fn skills_section(
    root: &Object,
    missing: &mut BTreeSet<FieldPath>,
    repairs: &mut Vec<Repair>,
) -> Vec<String> {
    let mut skills = Vec::new();
    match root.get("skills") {
        None => {
            missing.insert(FieldPath::section("skills"));
        }
        Some(Value::Array(items)) => items.iter().for_each(|item| collect_skills(item, &mut skills)),
        Some(value @ (Value::String(_) | Value::Object(_))) => {
            repairs.push(Repair::Coerced(FieldPath::section("skills")));
            collect_skills(value, &mut skills);
        }
        Some(other) => collect_skills(other, &mut skills),
    }
    skills
}

/// Flatten strings, comma-separated strings, and grouped skill lists
fn collect_skills(value: &Value, skills: &mut Vec<String>) {
    match value {
        Value::Null => {}
        Value::String(s) => skills.extend(s.split(',').map(|skill| skill.trim().to_string())),
        Value::Number(n) => skills.push(n.to_string()),
        Value::Bool(_) => {}
        Value::Array(items) => items.iter().for_each(|item| collect_skills(item, skills)),
        Value::Object(map) => map.values().for_each(|item| collect_skills(item, skills)),
    }
}

/// Fill null email/phone from the completion text, then the source text
fn fill_contact(
    contact: &mut Contact,
    completion_text: &str,
    source: Option<&str>,
    repairs: &mut Vec<Repair>,
) {
    if contact.email.is_some() && contact.phone.is_some() {
        return;
    }

    let mut hints = fallback::extract(completion_text);
    if let Some(source) = source {
        if hints.email.is_none() || hints.phone.is_none() {
            let from_source = fallback::extract(source);
            hints = ContactHints {
                email: hints.email.or(from_source.email),
                phone: hints.phone.or(from_source.phone),
            };
        }
    }

    if contact.email.is_none() {
        if let Some(email) = hints.email {
            debug!("Filled contact.email from fallback");
            contact.email = Some(email);
            repairs.push(Repair::ContactFilled(FieldPath::nested("contact", "email")));
        }
    }
    if contact.phone.is_none() {
        if let Some(phone) = hints.phone {
            debug!("Filled contact.phone from fallback");
            contact.phone = Some(phone);
            repairs.push(Repair::ContactFilled(FieldPath::nested("contact", "phone")));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_text(text: &str) -> DecodeOutcome {
        decode(&Completion::new(text))
    }

    const COMPLETE: &str = r#"{
        "contact": {"name": "Jane Doe", "email": "jane@x.com", "phone": "(555) 123-4567",
                    "location": "Seattle, WA", "linkedin": null},
        "experience": [{"company": "Fast", "title": "Engineer", "start_date": "October 2016",
                        "end_date": "Current", "location": "Seattle, WA", "description": "Built things"}],
        "skills": ["Rust", "Python"],
        "education": [{"institution": "University of Washington", "degree": "B.S.",
                       "start_date": "August 2004", "end_date": "May 2008", "location": "Seattle, WA"}]
    }"#;

    #[test]
    fn test_complete_output_is_decoded_verbatim() {
        match decode_text(COMPLETE) {
            DecodeOutcome::Decoded(resume) => {
                assert_eq!(resume.contact.name.as_deref(), Some("Jane Doe"));
                assert_eq!(resume.contact.linkedin, None);
                assert_eq!(resume.experience[0].company.as_deref(), Some("Fast"));
                assert_eq!(resume.experience[0].start_date.as_deref(), Some("October 2016"));
                assert_eq!(resume.education[0].end_date.as_deref(), Some("May 2008"));
                assert_eq!(resume.skills, vec!["Rust", "Python"]);
            }
            other => panic!("expected Decoded, got {:?}", other),
        }
    }

    #[test]
    fn test_data_wrapper_and_prose() {
        let text = format!(
            "Here is the extracted data:\n```json\n{{\"success\": true, \"data\": {}}}\n```\nLet me know!",
            COMPLETE
        );
        assert!(matches!(decode_text(&text), DecodeOutcome::Decoded(_)));
    }

    #[test]
    fn test_no_json_object() {
        match decode_text("I'm sorry, I cannot help with that. Reach me at bot@x.io") {
            DecodeOutcome::Undecodable {
                reason,
                salvaged_contact,
                raw_text,
            } => {
                assert_eq!(reason, UndecodableReason::NoJsonObject);
                assert_eq!(salvaged_contact.email.as_deref(), Some("bot@x.io"));
                assert!(raw_text.starts_with("I'm sorry"));
            }
            other => panic!("expected Undecodable, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_json() {
        let outcome = decode_text(r#"{"contact": {"name": Jane Doe}}"#);
        assert!(matches!(
            outcome,
            DecodeOutcome::Undecodable {
                reason: UndecodableReason::MalformedJson,
                ..
            }
        ));
    }

    #[test]
    fn test_schema_mismatch() {
        let outcome = decode_text(r#"{"answer": 42}"#);
        assert!(matches!(
            outcome,
            DecodeOutcome::Undecodable {
                reason: UndecodableReason::SchemaMismatch,
                ..
            }
        ));
    }

    #[test]
    fn test_first_parseable_candidate_wins() {
        let text = r#"Draft: {not json} Final: {"skills": ["Rust"], "contact": {"name": "A", "email": "a@b.co", "phone": "+1 555 123 4567", "location": null, "linkedin": null}, "experience": [], "education": []}"#;
        match decode_text(text) {
            DecodeOutcome::Decoded(resume) => assert_eq!(resume.skills, vec!["Rust"]),
            other => panic!("expected Decoded, got {:?}", other),
        }
    }

    #[test]
    fn test_record_after_prose_fragment_wins() {
        let text = format!(
            "Using the format {{\"note\": \"schema\"}} here is the result: {}",
            COMPLETE
        );
        match decode_text(&text) {
            DecodeOutcome::Decoded(resume) => {
                assert_eq!(resume.contact.email.as_deref(), Some("jane@x.com"));
                assert_eq!(resume.skills, vec!["Rust", "Python"]);
            }
            other => panic!("expected Decoded, got {:?}", other),
        }
    }

    #[test]
    fn test_cut_off_record_after_fragment_is_repaired() {
        let text = r#"Example: {"note": "schema"} Result: {"skills": ["Rust", "Go", "Pyt"#;
        match decode_text(text) {
            DecodeOutcome::Repaired {
                resume, repairs, ..
            } => {
                assert_eq!(resume.skills, vec!["Rust", "Go"]);
                assert!(repairs.contains(&Repair::SyntaxRepaired));
            }
            other => panic!("expected Repaired, got {:?}", other),
        }
    }

    #[test]
    fn test_fragments_without_sections_are_schema_mismatch() {
        let outcome = decode_text(r#"noise { "a": "}" } trailing"#);
        assert!(matches!(
            outcome,
            DecodeOutcome::Undecodable {
                reason: UndecodableReason::SchemaMismatch,
                ..
            }
        ));
    }

    #[test]
    fn test_commented_example_style_is_repaired() {
        let text = r#"{
          "experience": [
            {"company": "Fast", "title": "Engineer"}
            # other experiences ...
          ],
          "skills": ["Rust"],
        }"#;
        match decode_text(text) {
            DecodeOutcome::Repaired {
                resume,
                missing_fields,
                repairs,
            } => {
                assert_eq!(resume.experience.len(), 1);
                assert!(repairs.contains(&Repair::SyntaxRepaired));
                assert!(missing_fields.contains(&FieldPath::section("contact")));
                assert!(missing_fields.contains(&FieldPath::section("education")));
            }
            other => panic!("expected Repaired, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_output_is_repaired() {
        let outcome = decode(&Completion::new(
            r#"{"data": {"contact": {"name": "Jane"}, "skills": ["Rust", "Go"], "experience": [{"company": "Fa"#,
        ));
        let resume = outcome.resume().cloned().unwrap();
        assert_eq!(resume.contact.name.as_deref(), Some("Jane"));
        assert_eq!(resume.skills, vec!["Rust", "Go"]);
        assert!(resume.experience.is_empty());
    }

    #[test]
    fn test_single_objects_and_skill_string_coerced() {
        let text = r#"{
            "contact": {"name": "A", "email": "a@b.co", "phone": "555 123 4567", "location": "X", "linkedin": "Y"},
            "experience": {"company": "Fast"},
            "skills": "Rust, Go , rust",
            "education": {"institution": "UW"}
        }"#;
        match decode_text(text) {
            DecodeOutcome::Repaired {
                resume,
                missing_fields,
                repairs,
            } => {
                assert!(missing_fields.is_empty());
                assert_eq!(resume.experience.len(), 1);
                assert_eq!(resume.education.len(), 1);
                assert_eq!(resume.skills, vec!["Rust", "Go"]);
                assert_eq!(
                    repairs,
                    vec![
                        Repair::Coerced(FieldPath::section("experience")),
                        Repair::Coerced(FieldPath::section("skills")),
                        Repair::Coerced(FieldPath::section("education")),
                    ]
                );
            }
            other => panic!("expected Repaired, got {:?}", other),
        }
    }

    #[test]
    fn test_scalars_stringified_and_blanks_nulled() {
        let text = r#"{
            "contact": {"name": "  ", "email": "a@b.co", "phone": 5551234567, "location": ["Seattle", "WA"], "linkedin": ""},
            "experience": [{"company": "Fast", "description": ["Led team", "Shipped app"]}, {"company": null}],
            "skills": ["Rust", 3, null],
            "education": []
        }"#;
        let resume = decode_text(text).into_resume().unwrap();
        assert_eq!(resume.contact.name, None);
        assert_eq!(resume.contact.phone.as_deref(), Some("5551234567"));
        assert_eq!(resume.contact.location.as_deref(), Some("Seattle; WA"));
        assert_eq!(resume.contact.linkedin, None);
        assert_eq!(resume.experience.len(), 1);
        assert_eq!(
            resume.experience[0].description.as_deref(),
            Some("Led team; Shipped app")
        );
        assert_eq!(resume.skills, vec!["Rust", "3"]);
    }

    #[test]
    fn test_null_contact_fields_filled_from_source() {
        let completion = Completion::new(
            r#"{"contact": {"name": "Jane Doe", "email": null, "phone": null, "location": null, "linkedin": null},
                "experience": [], "skills": [], "education": []}"#,
        );
        let source = "Jane Doe jane@x.com (555) 123-4567";

        match decode_with_source(&completion, Some(source)) {
            DecodeOutcome::Repaired {
                resume,
                missing_fields,
                repairs,
            } => {
                assert!(missing_fields.is_empty());
                assert_eq!(resume.contact.email.as_deref(), Some("jane@x.com"));
                assert_eq!(resume.contact.phone.as_deref(), Some("(555) 123-4567"));
                assert_eq!(repairs.len(), 2);
            }
            other => panic!("expected Repaired, got {:?}", other),
        }
    }

    #[test]
    fn test_absent_contact_keys_are_missing() {
        let text = r#"{"contact": {"name": "Jane"}, "experience": [], "skills": [], "education": []}"#;
        let outcome = decode_text(text);
        let low: Vec<String> = outcome
            .low_confidence_fields()
            .iter()
            .map(|path| path.to_string())
            .collect();
        assert_eq!(
            low,
            vec!["contact.email", "contact.linkedin", "contact.location", "contact.phone"]
        );
    }

    #[test]
    fn test_grouped_skills_flattened() {
        let text = r#"{"skills": {"languages": ["Rust", "Go"], "tools": "Git, Docker"}}"#;
        let resume = decode_text(text).into_resume().unwrap();
        assert_eq!(resume.skills, vec!["Rust", "Go", "Git", "Docker"]);
    }
}
