//! Rule tables for certificate scoring and field extraction.

pub mod patterns;

pub use patterns::*;

use regex::Regex;

/// One alternative in a field's fallback chain.
#[derive(Debug)]
pub struct FieldPattern {
    pub regex: Regex,
    /// Capture group holding the field value.
    pub group: usize,
}

impl FieldPattern {
    pub fn new(pattern: &str, group: usize) -> Self {
        Self {
            regex: Regex::new(pattern).unwrap(),
            group,
        }
    }

    /// Captured value, if the pattern matches and the group is non-empty.
    pub fn capture(&self, text: &str) -> Option<String> {
        self.regex
            .captures(text)
            .and_then(|caps| caps.get(self.group))
            .map(|m| m.as_str().trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

/// Return the first non-empty capture of an ordered fallback chain.
pub fn first_capture(chain: &[FieldPattern], text: &str) -> Option<String> {
    chain.iter().find_map(|pattern| pattern.capture(text))
}

/// A weighted presence check used by the schema scorer.
#[derive(Debug)]
pub struct ScoredPattern {
    pub regex: Regex,
    pub weight: u32,
    /// Human readable field name reported when the pattern is missing.
    pub field: &'static str,
}

impl ScoredPattern {
    pub fn new(field: &'static str, weight: u32, pattern: &str) -> Self {
        Self {
            regex: Regex::new(pattern).unwrap(),
            weight,
            field,
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}
