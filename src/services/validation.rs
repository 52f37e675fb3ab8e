//! Input validation shared by the auth and account endpoints.

use crate::error::{AppError, AppResult};

/// Maximum length of an email address.
pub const MAX_EMAIL_LEN: usize = 255;

/// Validate an email address and return it trimmed and lowercased.
pub fn normalize_email(raw: &str) -> AppResult<String> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() || email.len() > MAX_EMAIL_LEN || !looks_like_email(&email) {
        return Err(AppError::InvalidInput("Invalid email address".to_string()));
    }
    Ok(email)
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

/// Require a trimmed string of `min..=max` characters.
pub fn require_text(field: &str, value: &str, min: usize, max: usize) -> AppResult<String> {
    let value = value.trim();
    let len = value.chars().count();
    if len < min || len > max {
        return Err(AppError::InvalidInput(format!(
            "{} must be between {} and {} characters",
            field, min, max
        )));
    }
    Ok(value.to_string())
}

/// Like [`require_text`], with markup characters stripped first.
pub fn sanitize_text(field: &str, value: &str, min: usize, max: usize) -> AppResult<String> {
    let cleaned: String = value
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '"' | '\'' | '`'))
        .collect();
    require_text(field, &cleaned, min, max)
}

/// Require a TCP port in `1..=65535`.
pub fn require_port(field: &str, value: u32) -> AppResult<u16> {
    match u16::try_from(value) {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(AppError::InvalidInput(format!(
            "{} must be between 1 and 65535",
            field
        ))),
    }
}
