//! Small helpers for credential validation and session token handling.

use base64::Engine;
use once_cell::sync::Lazy;
use rand::{rngs::OsRng, RngCore};
use regex::Regex;
use sha2::{Digest, Sha256};

use super::AuthError;

pub(super) const MIN_PASSWORD_CHARS: usize = 8;
pub(super) const MAX_PASSWORD_CHARS: usize = 128;

static EMAIL_REGEX: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

/// Normalize an email for lookup/uniqueness checks.
pub(super) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub(super) fn valid_email(email_normalized: &str) -> bool {
    EMAIL_REGEX
        .as_ref()
        .is_some_and(|regex| regex.is_match(email_normalized))
}

pub(super) fn valid_password(password: &str) -> bool {
    let chars = password.chars().count();
    (MIN_PASSWORD_CHARS..=MAX_PASSWORD_CHARS).contains(&chars)
}

/// Validate a signup pair, returning the normalized email.
pub(super) fn check_credential_format(email: &str, password: &str) -> Result<String, AuthError> {
    let email_normalized = normalize_email(email);
    if !valid_email(&email_normalized) {
        return Err(AuthError::InvalidCredentialFormat(
            "Invalid email".to_string(),
        ));
    }
    if !valid_password(password) {
        return Err(AuthError::InvalidCredentialFormat(format!(
            "Password must be between {MIN_PASSWORD_CHARS} and {MAX_PASSWORD_CHARS} characters"
        )));
    }
    Ok(email_normalized)
}

/// Create a new session token.
/// The raw value is only returned to the caller; the provider stores a hash.
pub(super) fn generate_session_token() -> Result<String, AuthError> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|err| AuthError::Internal(format!("failed to generate session token: {err}")))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

/// Hash a session token so raw values are never kept in memory tables.
pub(super) fn hash_session_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn email_regex_is_compiled_once() {
        assert!(EMAIL_REGEX.is_some());
        for _ in 0..3 {
            assert!(valid_email("a@example.com"));
            assert!(!valid_email("a@example"));
        }
    }

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@example.com"));
        assert!(valid_email("name.surname@example.co"));
    }

    #[test]
    fn valid_email_rejects_missing_at_or_domain() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("alice.example.com"));
        assert!(!valid_email("alice@localhost"));
        assert!(!valid_email("alice @example.com"));
    }

    #[test]
    fn valid_password_enforces_bounds() {
        assert!(!valid_password("short"));
        assert!(valid_password("long enough"));
        assert!(valid_password(&"x".repeat(MAX_PASSWORD_CHARS)));
        assert!(!valid_password(&"x".repeat(MAX_PASSWORD_CHARS + 1)));
    }

    #[test]
    fn check_credential_format_returns_normalized_email() {
        let email = check_credential_format(" Bob@Example.com", "correct horse");
        assert_eq!(email, Ok("bob@example.com".to_string()));
    }

    #[test]
    fn check_credential_format_reports_email_first() {
        let err = check_credential_format("bob", "x");
        assert_eq!(
            err,
            Err(AuthError::InvalidCredentialFormat(
                "Invalid email".to_string()
            ))
        );
    }

    #[test]
    fn generate_session_token_is_url_safe_32_bytes() -> Result<(), AuthError> {
        let token = generate_session_token()?;
        let decoded = URL_SAFE_NO_PAD
            .decode(token.as_bytes())
            .map_err(|err| AuthError::Internal(err.to_string()))?;
        assert_eq!(decoded.len(), 32);
        assert_ne!(token, generate_session_token()?);
        Ok(())
    }

    #[test]
    fn hash_session_token_is_sha256() {
        let hash = hash_session_token("token");
        assert_eq!(hash.len(), 32);
        assert_eq!(hash, hash_session_token("token"));
        assert_ne!(hash, hash_session_token("other"));
    }
}
