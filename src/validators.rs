/// Input validators for usernames and message content
/// Features:
/// 1. DoS Protection: Input length limits
/// 2. Identity hygiene: usernames restricted to a printable charset
/// 3. Data Theft Protection: control characters rejected

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

pub const MAX_USERNAME_LENGTH: usize = 64;
pub const MAX_MESSAGE_LENGTH: usize = 2000;

lazy_static! {
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_.\-]+$").unwrap();
}

/// Validates a username
/// - Returned verbatim: usernames match exactly as stored, no trimming or case folding
/// - Length between 1 and `MAX_USERNAME_LENGTH`
/// - ASCII letters, digits, `_`, `.` and `-` only
pub fn is_valid_username(username: &str) -> Result<String, ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::EmptyField("username"));
    }

    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong("username", MAX_USERNAME_LENGTH));
    }

    if !USERNAME_REGEX.is_match(username) {
        return Err(ValidationError::InvalidFormat("username"));
    }

    Ok(username.to_string())
}

/// Validates message content
/// - Trimmed, must be non-empty
/// - At most `MAX_MESSAGE_LENGTH` characters
/// - No control characters other than newline and tab
pub fn is_valid_message(content: &str) -> Result<String, ValidationError> {
    let trimmed = content.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("content"));
    }

    if trimmed.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(ValidationError::TooLong("content", MAX_MESSAGE_LENGTH));
    }

    if trimmed
        .chars()
        .any(|c| c.is_control() && c != '\n' && c != '\t')
    {
        return Err(ValidationError::SuspiciousContent("content"));
    }

    Ok(trimmed.to_string())
}
