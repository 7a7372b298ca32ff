//! The structured résumé record
//!
//! Field names here are the schema contract with the completion service:
//! they appear verbatim in the prompt's worked example and in the JSON the
//! service is asked to produce. Renaming a field is a wire-format change.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Structured résumé data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedResume {
    /// Contact details
    #[serde(default)]
    pub contact: Contact,

    /// Work history, in decoder order
    #[serde(default)]
    pub experience: Vec<Experience>,

    /// Skills, languages, tools and frameworks
    #[serde(default)]
    pub skills: Vec<String>,

    /// Education history, in decoder order
    #[serde(default)]
    pub education: Vec<Education>,
}

/// Contact details
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Full name
    #[serde(default)]
    pub name: Option<String>,
    /// Email address
    #[serde(default)]
    pub email: Option<String>,
    /// Phone number, as written in the source
    #[serde(default)]
    pub phone: Option<String>,
    /// City / region
    #[serde(default)]
    pub location: Option<String>,
    /// LinkedIn handle or URL
    #[serde(default)]
    pub linkedin: Option<String>,
}

/// One work-history entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    /// Employer
    #[serde(default)]
    pub company: Option<String>,
    /// Job title
    #[serde(default)]
    pub title: Option<String>,
    /// Start date, as written in the source
    #[serde(default)]
    pub start_date: Option<String>,
    /// End date, as written in the source ("Current" included)
    #[serde(default)]
    pub end_date: Option<String>,
    /// Location
    #[serde(default)]
    pub location: Option<String>,
    /// Summary of responsibilities and achievements
    #[serde(default)]
    pub description: Option<String>,
}

/// One education entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Education {
    /// School or university
    #[serde(default)]
    pub institution: Option<String>,
    /// Degree or qualification
    #[serde(default)]
    pub degree: Option<String>,
    /// Start date
    #[serde(default)]
    pub start_date: Option<String>,
    /// End date
    #[serde(default)]
    pub end_date: Option<String>,
    /// Location
    #[serde(default)]
    pub location: Option<String>,
}

impl Contact {
    /// Sub-field names, in schema order
    pub const FIELDS: [&'static str; 5] = ["name", "email", "phone", "location", "linkedin"];
}

impl Experience {
    /// Sub-field names, in schema order
    pub const FIELDS: [&'static str; 6] = [
        "company",
        "title",
        "start_date",
        "end_date",
        "location",
        "description",
    ];

    /// True when every field is null
    pub fn is_empty(&self) -> bool {
        self.company.is_none()
            && self.title.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.location.is_none()
            && self.description.is_none()
    }
}

impl Education {
    /// Sub-field names, in schema order
    pub const FIELDS: [&'static str; 5] =
        ["institution", "degree", "start_date", "end_date", "location"];

    /// True when every field is null
    pub fn is_empty(&self) -> bool {
        self.institution.is_none()
            && self.degree.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.location.is_none()
    }
}

impl ParsedResume {
    /// Top-level section names, in schema order
    pub const SECTIONS: [&'static str; 4] = ["contact", "experience", "skills", "education"];

    /// Enforce the record invariants in place
    ///
    /// - skills are trimmed, blank skills removed, and duplicates removed
    ///   case-insensitively (first occurrence wins)
    /// - experience and education entries with every field null are dropped
    ///
    /// Returns the number of items removed.
    pub fn enforce_invariants(&mut self) -> usize {
        let before = self.skills.len() + self.experience.len() + self.education.len();

        let mut seen = HashSet::new();
        let skills = std::mem::take(&mut self.skills);
        self.skills = skills
            .into_iter()
            .map(|skill| skill.trim().to_string())
            .filter(|skill| !skill.is_empty())
            .filter(|skill| seen.insert(skill.to_lowercase()))
            .collect();

        self.experience.retain(|entry| !entry.is_empty());
        self.education.retain(|entry| !entry.is_empty());

        before - (self.skills.len() + self.experience.len() + self.education.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skills_dedup_case_insensitive() {
        let mut resume = ParsedResume {
            skills: vec![
                "Python".to_string(),
                "python".to_string(),
                " Rust ".to_string(),
                "".to_string(),
                "PYTHON".to_string(),
                "rust".to_string(),
            ],
            ..Default::default()
        };

        let removed = resume.enforce_invariants();
        assert_eq!(resume.skills, vec!["Python", "Rust"]);
        assert_eq!(removed, 4);
    }

    #[test]
    fn test_empty_entries_dropped() {
        let mut resume = ParsedResume {
            experience: vec![
                Experience::default(),
                Experience {
                    company: Some("Fast".to_string()),
                    ..Default::default()
                },
            ],
            education: vec![Education::default()],
            ..Default::default()
        };

        resume.enforce_invariants();
        assert_eq!(resume.experience.len(), 1);
        assert_eq!(resume.experience[0].company.as_deref(), Some("Fast"));
        assert!(resume.education.is_empty());
    }

    #[test]
    fn test_deserialize_with_missing_fields() {
        let json = r#"{"contact": {"name": "Jane"}, "skills": ["Go"]}"#;
        let resume: ParsedResume = serde_json::from_str(json).unwrap();
        assert_eq!(resume.contact.name.as_deref(), Some("Jane"));
        assert!(resume.contact.email.is_none());
        assert!(resume.experience.is_empty());
        assert_eq!(resume.skills, vec!["Go"]);
    }

    #[test]
    fn test_serialize_keeps_nulls() {
        let value = serde_json::to_value(Contact::default()).unwrap();
        let obj = value.as_object().unwrap();
        for field in Contact::FIELDS {
            assert!(obj[field].is_null(), "{} should serialize as null", field);
        }
    }
}
