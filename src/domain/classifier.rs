//! Line classification for plan output.
//!
//! Decides per line whether it opens or closes a nested change block,
//! marks the start of the plan region, or is a confirmation prompt.
//! Lines are expected to be stripped of ANSI escape codes already.

/// Opening brackets that start a nested block when they end a line.
const OPENERS: [char; 3] = ['(', '[', '{'];

/// Closing brackets that end a nested block when they start a (trimmed) line.
const CLOSERS: [char; 3] = [')', ']', '}'];

pub const DEFAULT_START_PREFIXES: [&str; 3] = [
    "Terraform detected the following changes",
    "Terraform used the selected providers",
    "Terraform will perform the following actions",
];

pub const DEFAULT_START_SUFFIXES: [&str; 1] = ["Objects have changed outside of Terraform"];

pub const DEFAULT_PROMPTS: [&str; 2] = [
    "Do you want to perform these actions?",
    "Do you really want to destroy all resources?",
];

/// True iff the line is non-empty and its last character is `(`, `[` or `{`.
pub fn is_opener(line: &str) -> bool {
    line.chars().last().is_some_and(|c| OPENERS.contains(&c))
}

/// True iff the trimmed line is non-empty and starts with `)`, `]` or `}`.
pub fn is_closer(line: &str) -> bool {
    line.trim()
        .chars()
        .next()
        .is_some_and(|c| CLOSERS.contains(&c))
}

/// Marker-driven part of the classification.
///
/// The bracket rules are fixed; the region-start markers and prompt strings
/// default to what terraform prints and can be extended through settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classifier {
    start_prefixes: Vec<String>,
    start_suffixes: Vec<String>,
    prompts: Vec<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(
            DEFAULT_START_PREFIXES.iter().map(|s| s.to_string()).collect(),
            DEFAULT_START_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            DEFAULT_PROMPTS.iter().map(|s| s.to_string()).collect(),
        )
    }
}

impl Classifier {
    pub fn new(start_prefixes: Vec<String>, start_suffixes: Vec<String>, prompts: Vec<String>) -> Self {
        Self {
            start_prefixes,
            start_suffixes,
            prompts,
        }
    }

    /// True if the line marks the beginning of the change plan.
    pub fn is_region_start(&self, line: &str) -> bool {
        self.start_prefixes.iter().any(|p| line.starts_with(p.as_str()))
            || self.start_suffixes.iter().any(|s| line.ends_with(s.as_str()))
    }

    /// True if the line is exactly one of the confirmation questions.
    pub fn is_prompt(&self, line: &str) -> bool {
        self.prompts.iter().any(|p| p == line)
    }

    pub fn is_opener(&self, line: &str) -> bool {
        is_opener(line)
    }

    pub fn is_closer(&self, line: &str) -> bool {
        is_closer(line)
    }
}
