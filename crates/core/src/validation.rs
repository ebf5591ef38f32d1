//! Input validation utilities.
//!
//! This module contains functions for validating user inputs to ensure they meet
//! safety and correctness requirements before being used in operations.

use crate::constants::MAX_QUESTION_CHARS;
use crate::{PatientError, PatientResult};
use medchat_types::NonEmptyText;

/// Validates a free-text question before it is embedded in a prompt.
///
/// # Errors
///
/// Returns `PatientError::Text` if the question is empty after trimming, or
/// `PatientError::InvalidInput` if it exceeds [`MAX_QUESTION_CHARS`].
pub fn validate_question(input: &str) -> PatientResult<NonEmptyText> {
    let question = NonEmptyText::new(input)?;
    if question.as_str().chars().count() > MAX_QUESTION_CHARS {
        return Err(PatientError::InvalidInput(format!(
            "message exceeds maximum length of {} characters",
            MAX_QUESTION_CHARS
        )));
    }
    Ok(question)
}

/// Validates that a record store URL is an absolute `http` or `https` URL.
pub fn validate_store_url(url: &str) -> PatientResult<()> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(PatientError::InvalidConfig(
            "SUPABASE_URL cannot be empty".into(),
        ));
    }

    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .ok_or_else(|| {
            PatientError::InvalidConfig("SUPABASE_URL must start with http:// or https://".into())
        })?;

    if rest.trim_end_matches('/').is_empty() {
        return Err(PatientError::InvalidConfig(
            "SUPABASE_URL is missing a host".into(),
        ));
    }

    Ok(())
}

/// Truncates `text` to at most `max` characters, appending `…` when something was cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => format!("{}…", &text[..byte_idx]),
        None => text.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_is_trimmed() {
        let q = validate_question("  any allergies?\n").expect("valid question");
        assert_eq!(q.as_str(), "any allergies?");
    }

    #[test]
    fn empty_question_is_rejected() {
        let err = validate_question("   ").expect_err("empty question");
        assert!(matches!(err, PatientError::Text(_)));
    }

    #[test]
    fn overlong_question_is_rejected() {
        let err = validate_question(&"x".repeat(MAX_QUESTION_CHARS + 1)).expect_err("too long");
        match err {
            PatientError::InvalidInput(msg) => assert!(msg.contains("maximum length")),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn store_url_requires_scheme_and_host() {
        assert!(validate_store_url("https://abc.supabase.co").is_ok());
        assert!(validate_store_url("http://localhost:54321/").is_ok());
        assert!(validate_store_url("abc.supabase.co").is_err());
        assert!(validate_store_url("https://").is_err());
        assert!(validate_store_url("").is_err());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo…");
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("exact", 5), "exact");
    }
}
