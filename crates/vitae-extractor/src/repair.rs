//! Locating and repairing JSON objects in free-form text
//!
//! Model output is rarely just JSON: it comes wrapped in prose, split into
//! several fragments, or cut off at the token limit. [`scan_objects`] finds
//! candidate object regions with a brace counter that understands string
//! literals, and [`repair`] makes one best-effort pass over a candidate that
//! does not parse.

/// Object regions found in a text, in order of appearance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectScan<'a> {
    /// Balanced `{...}` regions
    pub balanced: Vec<&'a str>,
    /// A region opened but never closed, running to the end of the text
    pub unterminated: Option<&'a str>,
}

impl<'a> ObjectScan<'a> {
    /// True when the text contains no `{` at all
    pub fn is_empty(&self) -> bool {
        self.balanced.is_empty() && self.unterminated.is_none()
    }

    /// All regions in decode order: balanced first, then the unterminated one
    pub fn candidates(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.balanced.iter().copied().chain(self.unterminated)
    }

    /// The region the repair pass works on
    pub fn primary(&self) -> Option<&'a str> {
        self.balanced.first().copied().or(self.unterminated)
    }
}

/// Find top-level `{...}` regions
///
/// Braces inside string literals (including escaped quotes) do not count.
/// Strings are only tracked inside a region, so stray quotes in surrounding
/// prose cannot hide an object.
pub fn scan_objects(text: &str) -> ObjectScan<'_> {
    let mut scan = ObjectScan::default();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, c) in text.char_indices() {
        if depth == 0 {
            if c == '{' {
                start = idx;
                depth = 1;
            }
            continue;
        }

        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    scan.balanced.push(&text[start..=idx]);
                }
            }
            _ => {}
        }
    }

    if depth > 0 {
        scan.unterminated = Some(&text[start..]);
    }
    scan
}

/// One repair pass over a JSON-like object
///
/// Strips `#` and `//` line comments outside strings, drops trailing commas,
/// and if brackets are left open, cuts after the last complete value and
/// closes them. The result is not guaranteed to parse.
pub fn repair(candidate: &str) -> String {
    let cleaned = strip_comments(candidate);
    let cleaned = drop_trailing_commas(&cleaned);
    close_open(&cleaned)
}

fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        let comment = c == '#' || (c == '/' && chars.peek() == Some(&'/'));
        if comment {
            while chars.peek().is_some_and(|&next| next != '\n') {
                chars.next();
            }
            continue;
        }

        if c == '"' {
            in_string = true;
        }
        out.push(c);
    }
    out
}

fn drop_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if c == ',' {
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(c);
    }
    out
}

fn is_literal_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '.')
}

/// Cut after the last complete value and close whatever is still open
fn close_open(text: &str) -> String {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    let mut string_is_value = false;
    let mut in_literal = false;
    let mut prev: Option<char> = None;
    let mut last_complete: Option<(usize, Vec<char>)> = None;

    let in_value_position = |stack: &[char], prev: Option<char>| match prev {
        Some(':') => true,
        Some('[') | Some(',') => stack.last() == Some(&']'),
        _ => false,
    };

    for (idx, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
                prev = Some('"');
                if string_is_value {
                    last_complete = Some((idx + 1, stack.clone()));
                }
            }
            continue;
        }

        if in_literal && !is_literal_char(c) {
            in_literal = false;
            last_complete = Some((idx, stack.clone()));
        }

        match c {
            '"' => {
                string_is_value = in_value_position(&stack, prev);
                in_string = true;
            }
            '{' => {
                stack.push('}');
                last_complete = Some((idx + 1, stack.clone()));
            }
            '[' => {
                stack.push(']');
                last_complete = Some((idx + 1, stack.clone()));
            }
            '}' | ']' => {
                if stack.last() == Some(&c) {
                    stack.pop();
                }
                last_complete = Some((idx + 1, stack.clone()));
            }
            c if is_literal_char(c) && !in_literal => {
                in_literal = in_value_position(&stack, prev);
            }
            _ => {}
        }

        if !c.is_whitespace() {
            prev = Some(c);
        }
    }

    if stack.is_empty() && !in_string {
        return text.to_string();
    }

    match last_complete {
        Some((cut, open)) => {
            let mut out = text[..cut].trim_end().trim_end_matches(',').to_string();
            out.extend(open.iter().rev());
            out
        }
        None => text.to_string(),
    }
}
