//! Regex recovery of contact fields
//!
//! Small models often leave `email` or `phone` null even when the value is
//! plainly in the text. These patterns recover them deterministically. Name
//! extraction is left to the model.

use regex::Regex;
use std::sync::LazyLock;
use vitae_domain::ContactHints;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)+")
        .expect("email pattern should compile")
});

// Digits separated by at most two spaces, hyphens or parentheses each
static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\+?\(?\d(?:[ \-()]{0,2}\d)+").expect("phone pattern should compile")
});

/// Fewest digits accepted as a phone number
pub const MIN_PHONE_DIGITS: usize = 8;

/// Most digits accepted as a phone number
pub const MAX_PHONE_DIGITS: usize = 15;

/// Find the first email address and phone number in `text`
pub fn extract(text: &str) -> ContactHints {
    ContactHints {
        email: find_email(text),
        phone: find_phone(text),
    }
}

/// First `local@domain.tld` match
pub fn find_email(text: &str) -> Option<String> {
    EMAIL.find(text).map(|m| m.as_str().to_string())
}

/// First digit run with 8 to 15 digits
pub fn find_phone(text: &str) -> Option<String> {
    PHONE
        .find_iter(text)
        .map(|m| m.as_str())
        .find(|candidate| {
            let digits = candidate.chars().filter(char::is_ascii_digit).count();
            (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits)
        })
        .map(str::to_string)
}
