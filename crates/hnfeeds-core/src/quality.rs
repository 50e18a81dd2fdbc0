use regex::Regex;

use crate::error::{AppError, RejectReason};
use crate::models::Extracted;

pub const DEFAULT_CHALLENGE_PHRASES: &[&str] = &["Are you a robot?"];
pub const DEFAULT_MAX_UNWRAPPED_LEN: usize = 1000;

/// Acceptance checks applied to every local extraction.
///
/// The plausibility check only rejects fragments that are both longer than
/// `max_unwrapped_len` characters and not a single `<body>...</body>` wrapper.
/// Short fragments pass whatever their shape, as do large well-formed ones.
#[derive(Debug, Clone)]
pub struct QualityGates {
    challenge_phrases: Vec<String>,
    max_unwrapped_len: usize,
    body_wrapper: Regex,
}

impl QualityGates {
    pub fn new(challenge_phrases: Vec<String>, max_unwrapped_len: usize) -> Self {
        Self {
            challenge_phrases,
            max_unwrapped_len,
            body_wrapper: body_wrapper_regex(),
        }
    }

    pub fn with_max_unwrapped_len(mut self, max_unwrapped_len: usize) -> Self {
        self.max_unwrapped_len = max_unwrapped_len;
        self
    }

    /// Run both gates, bot check first.
    pub fn check(&self, extracted: &Extracted) -> Result<(), AppError> {
        if self.is_bot_check(&extracted.title) {
            return Err(AppError::ExtractionRejected(RejectReason::BotCheck));
        }
        if self.is_implausible(&extracted.content) {
            return Err(AppError::ExtractionRejected(RejectReason::Implausible));
        }
        Ok(())
    }

    pub fn is_bot_check(&self, title: &str) -> bool {
        self.challenge_phrases
            .iter()
            .any(|phrase| title.contains(phrase.as_str()))
    }

    pub fn is_implausible(&self, fragment: &str) -> bool {
        fragment.chars().count() > self.max_unwrapped_len && !self.is_single_body(fragment)
    }

    fn is_single_body(&self, fragment: &str) -> bool {
        self.body_wrapper.is_match(fragment) && fragment.matches("<body").count() == 1
    }
}

impl Default for QualityGates {
    fn default() -> Self {
        Self::new(
            DEFAULT_CHALLENGE_PHRASES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            DEFAULT_MAX_UNWRAPPED_LEN,
        )
    }
}

fn body_wrapper_regex() -> Regex {
    match Regex::new(r"(?is)^\s*<body\b[^>]*>.*</body>\s*$") {
        Ok(re) => re,
        Err(e) => unreachable!("body wrapper pattern must compile: {e}"),
    }
}
