use app_error::{AppError, AppResult};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Email validation regex
    // This pattern checks for a valid email format with proper domain
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^([a-z0-9_+]([a-z0-9_+.]*[a-z0-9_+])?)@([a-z0-9]+([\-\.]{1}[a-z0-9]+)*\.[a-z]{2,6})"
    ).unwrap();
}

/// Validates an email address
pub fn validate_email(email: &str) -> AppResult<()> {
    if email.trim().is_empty() {
        return Err(AppError::validation("email", "Email cannot be empty"));
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(AppError::validation("email", "Invalid email format"));
    }

    Ok(())
}

/// Validates an assembled user record before it is persisted: required
/// fields present, email well-formed.
pub fn validate_user_record(email: &str, user_name: &str, password_hash: &str) -> AppResult<()> {
    validate_email(email)?;

    if user_name.trim().is_empty() {
        return Err(AppError::validation("userName", "Display name cannot be empty"));
    }

    if password_hash.trim().is_empty() {
        return Err(AppError::validation("password", "Password hash cannot be empty"));
    }

    Ok(())
}

/// Sanitizes a string input by trimming whitespace
pub fn sanitize_string(input: &str) -> String {
    input.trim().to_string()
}
