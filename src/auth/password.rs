/// Password Hashing and Verification
///
/// bcrypt with a per-call random salt and a configurable work factor.

use bcrypt::{hash, verify};

use crate::error::{AppError, CredentialError, ValidationError};

/// bcrypt only consumes the first 72 bytes of its input.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Hash a password using bcrypt
///
/// # Errors
/// - `ValidationError::EmptyField` for an empty password
/// - `CredentialError::HashingFailed` if the password exceeds bcrypt's input
///   limit or bcrypt itself fails (e.g. cost out of range)
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password").into());
    }

    // bcrypt would silently truncate past this point.
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(CredentialError::HashingFailed(format!(
            "password exceeds {} bytes",
            MAX_PASSWORD_BYTES
        ))
        .into());
    }

    hash(password, cost).map_err(|e| CredentialError::HashingFailed(e.to_string()).into())
}

/// Verify a password against its bcrypt hash
///
/// Returns `Ok(false)` on mismatch.
///
/// # Errors
/// `CredentialError::HashingFailed` if the stored hash cannot be parsed
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Ok(false);
    }

    verify(password, password_hash)
        .map_err(|e| CredentialError::HashingFailed(e.to_string()).into())
}
