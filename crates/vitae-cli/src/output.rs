//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use vitae_domain::{DecodeOutcome, ExtractedText, FinishReason, ParsedResume};
use vitae_extractor::{ParseReport, Prompt};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// The active output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format a full parse report.
    pub fn format_report(&self, report: &ParseReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Quiet => self.format_outcome(&report.outcome),
            OutputFormat::Summary => {
                let mut lines = vec![self.format_outcome(&report.outcome)?, String::new()];
                lines.push(self.info(&format!(
                    "{} in {} ms, ~{} prompt tokens",
                    report.model_name, report.processing_time_ms, report.prompt_tokens
                )));
                if report.truncated {
                    lines.push(self.warning("Document was truncated to fit the context window"));
                }
                if report.finish_reason == FinishReason::Length {
                    lines.push(self.warning("Completion stopped at the token limit"));
                }
                if report.has_empty_segments {
                    lines.push(self.warning("Some pages or paragraphs had no text"));
                }
                Ok(lines.join("\n"))
            }
        }
    }

    /// Format a decode outcome.
    pub fn format_outcome(&self, outcome: &DecodeOutcome) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(outcome)?),
            OutputFormat::Quiet => match outcome.resume() {
                Some(resume) => Ok(serde_json::to_string(resume)?),
                None => Ok(String::new()),
            },
            OutputFormat::Summary => Ok(self.outcome_summary(outcome)),
        }
    }

    /// Format extracted document text.
    pub fn format_text(&self, text: &ExtractedText) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(text)?),
            OutputFormat::Summary | OutputFormat::Quiet => Ok(text.text.clone()),
        }
    }

    /// Format a prompt.
    pub fn format_prompt(&self, prompt: &Prompt) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "prompt": prompt.render(),
                "token_estimate": prompt.token_estimate(),
                "declared_token_budget": prompt.declared_token_budget(),
                "truncated": prompt.truncated(),
                "original_token_estimate": prompt.original_token_estimate(),
            }))?),
            OutputFormat::Summary | OutputFormat::Quiet => Ok(prompt.render()),
        }
    }

    fn outcome_summary(&self, outcome: &DecodeOutcome) -> String {
        match outcome {
            DecodeOutcome::Decoded(resume) => self.resume_summary(resume),
            DecodeOutcome::Repaired {
                resume, repairs, ..
            } => {
                let mut lines = vec![self.resume_summary(resume), String::new()];
                let fields: Vec<String> = outcome
                    .low_confidence_fields()
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                if !fields.is_empty() {
                    lines.push(self.warning(&format!("Low confidence: {}", fields.join(", "))));
                }
                if !repairs.is_empty() {
                    lines.push(self.info(&format!("{} repair(s) applied", repairs.len())));
                }
                lines.join("\n")
            }
            DecodeOutcome::Undecodable {
                raw_text,
                reason,
                salvaged_contact,
            } => {
                let mut lines = vec![self.error(&format!("Undecodable model output ({})", reason))];
                if let Some(email) = &salvaged_contact.email {
                    lines.push(format!("  Email: {}", email));
                }
                if let Some(phone) = &salvaged_contact.phone {
                    lines.push(format!("  Phone: {}", phone));
                }
                lines.push(String::new());
                lines.push(self.colorize("Raw output:", "magenta"));
                lines.push(raw_text.clone());
                lines.join("\n")
            }
        }
    }

    fn resume_summary(&self, resume: &ParsedResume) -> String {
        let contact = &resume.contact;
        let mut lines = vec![self.colorize(contact.name.as_deref().unwrap_or("(no name)"), "cyan")];

        for (label, value) in [
            ("Email", &contact.email),
            ("Phone", &contact.phone),
            ("Location", &contact.location),
            ("LinkedIn", &contact.linkedin),
        ] {
            if let Some(value) = value {
                lines.push(format!("  {}: {}", label, value));
            }
        }

        if !resume.experience.is_empty() {
            lines.push(String::new());
            lines.push(self.colorize(&format!("Experience ({})", resume.experience.len()), "blue"));
            for job in &resume.experience {
                let role = join_present(&[job.title.as_deref(), job.company.as_deref()], " at ");
                lines.push(format!(
                    "  {}{}",
                    role,
                    date_range(job.start_date.as_deref(), job.end_date.as_deref())
                ));
                if let Some(description) = &job.description {
                    lines.push(format!("    {}", description));
                }
            }
        }

        if !resume.skills.is_empty() {
            lines.push(String::new());
            lines.push(format!(
                "{} {}",
                self.colorize("Skills:", "blue"),
                resume.skills.join(", ")
            ));
        }

        if !resume.education.is_empty() {
            lines.push(String::new());
            lines.push(self.colorize(&format!("Education ({})", resume.education.len()), "blue"));
            for school in &resume.education {
                let entry = join_present(&[school.degree.as_deref(), school.institution.as_deref()], ", ");
                lines.push(format!(
                    "  {}{}",
                    entry,
                    date_range(school.start_date.as_deref(), school.end_date.as_deref())
                ));
            }
        }

        lines.join("\n")
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            "magenta" => text.magenta().to_string(),
            _ => text.to_string(),
        }
    }
}

fn join_present(parts: &[Option<&str>], separator: &str) -> String {
    let present: Vec<&str> = parts.iter().flatten().copied().collect();
    if present.is_empty() {
        "(untitled)".to_string()
    } else {
        present.join(separator)
    }
}

fn date_range(start: Option<&str>, end: Option<&str>) -> String {
    match (start, end) {
        (Some(start), Some(end)) => format!(" ({} - {})", start, end),
        (Some(start), None) => format!(" (from {})", start),
        (None, Some(end)) => format!(" (until {})", end),
        (None, None) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use vitae_domain::{Contact, ContactHints, Education, Experience, FieldPath, Repair, UndecodableReason};

    fn create_test_resume() -> ParsedResume {
        ParsedResume {
            contact: Contact {
                name: Some("Jane Doe".to_string()),
                email: Some("jane@x.com".to_string()),
                ..Contact::default()
            },
            experience: vec![Experience {
                company: Some("Initech".to_string()),
                title: Some("Staff Engineer".to_string()),
                start_date: Some("Jan 2019".to_string()),
                end_date: Some("Present".to_string()),
                ..Experience::default()
            }],
            skills: vec!["Rust".to_string(), "PostgreSQL".to_string()],
            education: vec![Education {
                institution: Some("UT Austin".to_string()),
                degree: None,
                start_date: None,
                end_date: Some("2015".to_string()),
                location: None,
            }],
        }
    }

    #[test]
    fn test_summary_format() {
        let formatter = Formatter::new(OutputFormat::Summary, false);
        let output = formatter
            .format_outcome(&DecodeOutcome::Decoded(create_test_resume()))
            .unwrap();
        assert!(output.starts_with("Jane Doe\n  Email: jane@x.com"));
        assert!(output.contains("  Staff Engineer at Initech (Jan 2019 - Present)"));
        assert!(output.contains("Skills: Rust, PostgreSQL"));
        assert!(output.contains("  UT Austin (until 2015)"));
        assert!(!output.contains("Phone"));
    }

    #[test]
    fn test_repaired_lists_low_confidence_fields() {
        let formatter = Formatter::new(OutputFormat::Summary, false);
        let outcome = DecodeOutcome::Repaired {
            resume: create_test_resume(),
            missing_fields: BTreeSet::from([FieldPath::from("education")]),
            repairs: vec![Repair::ContactFilled(FieldPath::from("contact.email"))],
        };
        let output = formatter.format_outcome(&outcome).unwrap();
        assert!(output.contains("⚠ Low confidence: contact.email, education"));
        assert!(output.contains("ℹ 1 repair(s) applied"));
    }

    #[test]
    fn test_undecodable_shows_raw_text() {
        let formatter = Formatter::new(OutputFormat::Summary, false);
        let outcome = DecodeOutcome::Undecodable {
            raw_text: "no idea".to_string(),
            reason: UndecodableReason::NoJsonObject,
            salvaged_contact: ContactHints {
                email: Some("jane@x.com".to_string()),
                phone: None,
            },
        };
        let output = formatter.format_outcome(&outcome).unwrap();
        assert!(output.starts_with("✗ Undecodable model output (no-json-object)"));
        assert!(output.contains("  Email: jane@x.com"));
        assert!(output.ends_with("Raw output:\nno idea"));
    }

    #[test]
    fn test_quiet_format_is_bare_record() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let output = formatter
            .format_outcome(&DecodeOutcome::Decoded(create_test_resume()))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["contact"]["name"], "Jane Doe");
        assert!(value.get("outcome").is_none());
    }

    #[test]
    fn test_json_format_is_tagged() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter
            .format_outcome(&DecodeOutcome::Decoded(create_test_resume()))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["outcome"], "decoded");
    }

    #[test]
    fn test_date_range() {
        assert_eq!(date_range(Some("2019"), Some("2021")), " (2019 - 2021)");
        assert_eq!(date_range(Some("2019"), None), " (from 2019)");
        assert_eq!(date_range(None, None), "");
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Summary, false);
        let msg = formatter.success("test");
        assert_eq!(msg, "✓ test");
    }
}
