//! Error types for provider construction and identity operations.

use thiserror::Error;

/// Boot-time failure to build the identity provider. Always fatal.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("invalid identity provider configuration: {0}")]
    InvalidConfiguration(String),

    #[error("identity backend unavailable: {0}")]
    BackendUnavailable(String),
}

/// Per-request identity failure, recoverable and surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    DuplicateAccount,

    #[error("{0}")]
    InvalidCredentialFormat(String),

    #[error("Account temporarily locked after repeated failures")]
    AccountLocked,

    #[error("Identity backend timed out")]
    BackendTimeout,

    /// Unexpected backend fault. The message is logged, never returned.
    #[error("Identity backend error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Stable machine-readable kind used in JSON error bodies.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            Self::DuplicateAccount => "duplicate_account",
            Self::InvalidCredentialFormat(_) => "invalid_credential_format",
            Self::AccountLocked => "account_locked",
            Self::BackendTimeout => "backend_timeout",
            Self::Internal(_) => "internal_error",
        }
    }
}
