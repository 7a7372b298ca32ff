//! Prompt construction with a token budget
//!
//! The prompt is a fixed instruction header and worked example followed by
//! the document text. The header and example are never shortened; when the
//! document does not fit in what the context window has left, the document
//! excerpt is cut instead and the prompt is marked truncated.
//!
//! Token counts are estimates (`ceil(chars / CHARS_PER_TOKEN)`), not real
//! tokenizer output.

use crate::config::{ExtractorConfig, TruncationPolicy};
use crate::error::ExtractorError;
use tracing::{debug, warn};
use vitae_domain::ExtractedText;

/// Characters per estimated token
pub const CHARS_PER_TOKEN: usize = 4;

/// Estimate the token count of `text`
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// How the context window is split between prompt and completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptBudget {
    /// Model context window (prompt + completion)
    pub context_window_tokens: usize,
    /// Tokens kept free for the completion
    pub reserved_completion_tokens: usize,
    /// Tokens charged for the fixed instruction text
    pub instruction_token_estimate: usize,
}

impl PromptBudget {
    /// Tokens left for the document excerpt, if any
    pub fn available(&self) -> Option<usize> {
        self.context_window_tokens
            .checked_sub(self.reserved_completion_tokens)?
            .checked_sub(self.instruction_token_estimate)
            .filter(|available| *available > 0)
    }
}

impl From<&ExtractorConfig> for PromptBudget {
    fn from(config: &ExtractorConfig) -> Self {
        Self {
            context_window_tokens: config.context_window_tokens,
            reserved_completion_tokens: config.reserved_completion_tokens,
            instruction_token_estimate: config.instruction_token_estimate,
        }
    }
}

/// A built prompt; immutable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    input_excerpt: String,
    declared_token_budget: usize,
    truncated: bool,
    original_token_estimate: usize,
}

impl Prompt {
    /// The constant instruction header
    pub fn instruction_header(&self) -> &'static str {
        INSTRUCTION_HEADER
    }

    /// The constant worked example (the schema contract)
    pub fn schema_example(&self) -> &'static str {
        SCHEMA_EXAMPLE
    }

    /// The document text included in the prompt
    pub fn input_excerpt(&self) -> &str {
        &self.input_excerpt
    }

    /// Tokens that were available for the excerpt
    pub fn declared_token_budget(&self) -> usize {
        self.declared_token_budget
    }

    /// True if the excerpt is shorter than the document
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// Estimated tokens of the full document before truncation
    pub fn original_token_estimate(&self) -> usize {
        self.original_token_estimate
    }

    /// Estimated tokens of the rendered prompt
    pub fn token_estimate(&self) -> usize {
        estimate_tokens(&self.render())
    }

    /// The exact text sent to the completion service
    pub fn render(&self) -> String {
        let mut prompt = String::with_capacity(
            INSTRUCTION_HEADER.len()
                + SCHEMA_EXAMPLE.len()
                + CLOSING_LEAD.len()
                + self.input_excerpt.len()
                + CLOSING_TAIL.len()
                + 8,
        );

        prompt.push_str(INSTRUCTION_HEADER);
        prompt.push_str(SCHEMA_EXAMPLE);
        prompt.push_str("\n\n");
        prompt.push_str(CLOSING_LEAD);
        prompt.push_str("\n\n");
        prompt.push_str(&self.input_excerpt);
        prompt.push_str("\n\n");
        prompt.push_str(CLOSING_TAIL);
        prompt.push('\n');

        prompt
    }
}

/// Builds prompts within a token budget
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    budget: PromptBudget,
    policy: TruncationPolicy,
}

impl PromptBuilder {
    /// Create a builder
    pub fn new(budget: PromptBudget, policy: TruncationPolicy) -> Self {
        Self { budget, policy }
    }

    /// Create a builder from extractor configuration
    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self::new(PromptBudget::from(config), config.truncation)
    }

    /// Estimated tokens of the constant prompt text
    ///
    /// `instruction_token_estimate` should be at least this large.
    pub fn fixed_token_estimate() -> usize {
        estimate_tokens(INSTRUCTION_HEADER)
            + estimate_tokens(SCHEMA_EXAMPLE)
            + estimate_tokens(CLOSING_LEAD)
            + estimate_tokens(CLOSING_TAIL)
            + 2
    }

    /// The budget this builder enforces
    pub fn budget(&self) -> &PromptBudget {
        &self.budget
    }

    /// Build a prompt for `text`
    ///
    /// # Errors
    ///
    /// - [`ExtractorError::EmptyDocument`] if `text` is blank
    /// - [`ExtractorError::PromptTooLarge`] if the budget leaves no room
    pub fn build(&self, text: &ExtractedText) -> Result<Prompt, ExtractorError> {
        if text.is_blank() {
            return Err(ExtractorError::EmptyDocument);
        }

        let available = self.budget.available().ok_or_else(|| {
            ExtractorError::PromptTooLarge(format!(
                "context window {} leaves no room after {} completion and {} instruction tokens",
                self.budget.context_window_tokens,
                self.budget.reserved_completion_tokens,
                self.budget.instruction_token_estimate
            ))
        })?;

        let original_token_estimate = estimate_tokens(&text.text);
        let truncated = original_token_estimate > available;

        let input_excerpt = if truncated {
            let max_chars = available.saturating_mul(CHARS_PER_TOKEN);
            warn!(
                "Document (~{} tokens) exceeds budget of {} tokens; keeping {:?} {} chars",
                original_token_estimate, available, self.policy, max_chars
            );
            match self.policy {
                TruncationPolicy::Head => head_excerpt(&text.text, max_chars),
                TruncationPolicy::Tail => tail_excerpt(&text.text, max_chars),
            }
        } else {
            text.text.clone()
        };

        debug!(
            "Prompt excerpt: {} of ~{} tokens (budget {})",
            estimate_tokens(&input_excerpt),
            original_token_estimate,
            available
        );

        Ok(Prompt {
            input_excerpt,
            declared_token_budget: available,
            truncated,
            original_token_estimate,
        })
    }
}

/// First `max_chars` characters, cut at whitespace in the last quarter if possible
fn head_excerpt(text: &str, max_chars: usize) -> String {
    let cut = text
        .char_indices()
        .nth(max_chars)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    let window = &text[..cut];

    let floor = max_chars - max_chars / 4;
    let soft_cut = window
        .char_indices()
        .skip(floor)
        .filter(|(_, c)| c.is_whitespace())
        .last()
        .map(|(idx, _)| idx);

    match soft_cut {
        Some(idx) => window[..idx].trim_end().to_string(),
        None => window.to_string(),
    }
}

/// Last `max_chars` characters, cut at whitespace in the first quarter if possible
fn tail_excerpt(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    let start = text
        .char_indices()
        .nth(total.saturating_sub(max_chars))
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    let window = &text[start..];

    let soft_cut = window
        .char_indices()
        .take(max_chars / 4)
        .find(|(_, c)| c.is_whitespace())
        .map(|(idx, c)| idx + c.len_utf8());

    match soft_cut {
        Some(idx) => window[idx..].trim_start().to_string(),
        None => window.to_string(),
    }
}

const INSTRUCTION_HEADER: &str = r#"Your job is to extract structured resume information from the given text.

You must find and return:
- Contact: full name, email, phone number, location, LinkedIn (if available)
- Experience: company, title, start date, end date, location, description
- Skills: list of relevant skills, languages, tools, or frameworks
- Education: institution, degree, start date, end date, location

Input example:
Tasiana Ukura
tukura@email.com (123) 456-7890 Seattle, WA LinkedIn
WORK EXPERIENCE
Fast - Senior Software Engineer
October 2016 - current Seattle, WA
· Built and maintained application that scaled to 2M daily users, communicating with cross-functional teams regarding product and design
...

------------------
Desired JSON output:
------------------
"#;

const SCHEMA_EXAMPLE: &str = r#"{
  "success": true,
  "data": {
    "contact": {
      "name": "Tasiana Ukura",
      "email": "tukura@email.com",
      "phone": "(123) 456-7890",
      "location": "Seattle, WA",
      "linkedin": "LinkedIn"
    },
    "experience": [
      {
        "company": "Fast",
        "title": "Senior Software Engineer",
        "start_date": "October 2016",
        "end_date": "Current",
        "location": "Seattle, WA",
        "description": "Built and maintained an application that scaled to 2M daily users; collaborated with cross-functional teams; transformed UIs using React to reduce debugging time by 62% and increase views by 31%; mentored 6 interns; led a team improving e-commerce payment protection by 15%."
      }
    ],
    "skills": [
      "Python", "JavaScript", "C++", "Java", "Django", "NodeJS", "React", "jQuery", "Unix", "Git", "Selenium", "SQL", "NoSQL", "AWS"
    ],
    "education": [
      {
        "institution": "University of Washington",
        "degree": "B.S. in Computer Science",
        "start_date": "August 2004",
        "end_date": "May 2008",
        "location": "Seattle, WA"
      }
    ]
  }
}"#;

const CLOSING_LEAD: &str = "Now, use the same logic to extract information from the following text:";

const CLOSING_TAIL: &str = "Your output should be a JSON object.";

#[cfg(test)]
mod tests {
    use super::*;
    use vitae_domain::{DocumentFormat, ParsedResume};

    fn text(body: &str) -> ExtractedText {
        ExtractedText::new(body, DocumentFormat::Pdf, false)
    }

    fn builder(ctx: usize, reserved: usize, instruction: usize) -> PromptBuilder {
        PromptBuilder::new(
            PromptBudget {
                context_window_tokens: ctx,
                reserved_completion_tokens: reserved,
                instruction_token_estimate: instruction,
            },
            TruncationPolicy::Head,
        )
    }

    #[test]
    fn test_estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
        // Characters, not bytes
        assert_eq!(estimate_tokens("éééé"), 1);
    }

    #[test]
    fn test_huge_budget_keeps_whole_document() {
        let prompt = builder(usize::MAX, 1, 1).build(&text("Jane Doe")).unwrap();
        assert!(!prompt.truncated());
        assert_eq!(prompt.declared_token_budget(), usize::MAX - 2);
    }

    #[test]
    fn test_truncation_bound() {
        let builder = builder(100, 20, 30);

        let exact = "a".repeat(200);
        let prompt = builder.build(&text(&exact)).unwrap();
        assert!(!prompt.truncated());
        assert_eq!(prompt.input_excerpt(), exact);
        assert_eq!(prompt.declared_token_budget(), 50);

        let over = "a".repeat(201);
        let prompt = builder.build(&text(&over)).unwrap();
        assert!(prompt.truncated());
        assert!(estimate_tokens(prompt.input_excerpt()) <= 50);
        assert_eq!(prompt.original_token_estimate(), 51);
    }

    #[test]
    fn test_truncation_prefers_word_boundary() {
        let builder = builder(100, 20, 30);
        let words = "word ".repeat(100);

        let prompt = builder.build(&text(words.trim())).unwrap();
        assert!(prompt.truncated());
        assert!(prompt.input_excerpt().ends_with("word"));
        assert!(prompt.input_excerpt().chars().count() <= 200);
        assert!(prompt.input_excerpt().chars().count() >= 150);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let builder = builder(100, 20, 30);
        let body = "ü".repeat(300);

        let prompt = builder.build(&text(&body)).unwrap();
        assert!(prompt.truncated());
        assert_eq!(prompt.input_excerpt().chars().count(), 200);
    }

    #[test]
    fn test_tail_policy_keeps_end() {
        let builder = PromptBuilder::new(
            PromptBudget {
                context_window_tokens: 100,
                reserved_completion_tokens: 20,
                instruction_token_estimate: 30,
            },
            TruncationPolicy::Tail,
        );
        let body = format!("{} THE END", "start ".repeat(100));

        let prompt = builder.build(&text(&body)).unwrap();
        assert!(prompt.truncated());
        assert!(prompt.input_excerpt().ends_with("THE END"));
        assert!(prompt.input_excerpt().starts_with("start"));
        assert!(estimate_tokens(prompt.input_excerpt()) <= 50);
    }

    #[test]
    fn test_zero_budget_is_prompt_too_large() {
        let result = builder(100, 50, 50).build(&text("hello"));
        assert!(matches!(result, Err(ExtractorError::PromptTooLarge(_))));

        let result = builder(100, 80, 50).build(&text("hello"));
        assert!(matches!(result, Err(ExtractorError::PromptTooLarge(_))));
    }

    #[test]
    fn test_blank_text_fails_fast() {
        let result = builder(100, 20, 30).build(&text("  \n "));
        assert!(matches!(result, Err(ExtractorError::EmptyDocument)));
    }

    #[test]
    fn test_render_layout() {
        let prompt = builder(8192, 3096, 800).build(&text("Jane Doe\nEngineer")).unwrap();
        let rendered = prompt.render();

        assert!(rendered.starts_with("Your job is to extract structured resume information"));
        assert!(rendered.contains(prompt.schema_example()));
        assert!(rendered.contains(
            "following text:\n\nJane Doe\nEngineer\n\nYour output should be a JSON object.\n"
        ));
        assert!(rendered.ends_with("Your output should be a JSON object.\n"));
    }

    #[test]
    fn test_fixed_text_fits_default_estimate() {
        let config = ExtractorConfig::default();
        assert!(PromptBuilder::fixed_token_estimate() <= config.instruction_token_estimate);

        let prompt = PromptBuilder::from_config(&config).build(&text("x")).unwrap();
        assert!(prompt.token_estimate() <= config.instruction_token_estimate + 1);
    }

    #[test]
    fn test_schema_example_is_stable() {
        // The worked example is the field-name contract with the model.
        let value: serde_json::Value = serde_json::from_str(SCHEMA_EXAMPLE).unwrap();
        assert_eq!(value["success"], true);

        let data = &value["data"];
        let contact: Vec<&str> = data["contact"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        let mut expected_contact = vitae_domain::Contact::FIELDS.to_vec();
        expected_contact.sort_unstable();
        let mut contact_sorted = contact.clone();
        contact_sorted.sort_unstable();
        assert_eq!(contact_sorted, expected_contact);

        let resume: ParsedResume = serde_json::from_value(data.clone()).unwrap();
        assert_eq!(resume.contact.name.as_deref(), Some("Tasiana Ukura"));
        assert_eq!(resume.experience.len(), 1);
        assert_eq!(resume.skills.len(), 14);
        assert_eq!(resume.education[0].degree.as_deref(), Some("B.S. in Computer Science"));

        assert_eq!(SCHEMA_EXAMPLE.len(), 1139);
    }
}
