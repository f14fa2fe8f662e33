//! Identity provider contract and the bundled in-memory provider.
//!
//! The HTTP layer only depends on [`IdentityProvider`]; any backend that can
//! register credentials, authenticate them and vouch for the sessions it issued
//! can be plugged in behind it.

mod error;
mod memory;
mod supervisor;
mod utils;

pub use error::{AuthError, InitError};
pub use memory::{MemoryIdentityProvider, ProviderConfig};
pub use supervisor::{initialize, initialize_with, OperatingMode};

#[cfg(test)]
pub(crate) use memory::tests::fast_config as test_provider_config;

use async_trait::async_trait;
use secrecy::SecretString;
use std::{fmt, sync::Arc, time::SystemTime};

/// Shared, read-only capability to verify credentials and issue sessions.
pub type IdentityProviderHandle = Arc<dyn IdentityProvider>;

/// Opaque credential returned to a successfully authenticated caller.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    #[must_use]
    pub fn new(token: String) -> Self {
        Self(token)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

/// What a provider knows about a live session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionInfo {
    pub email: String,
    pub issued_at: SystemTime,
    pub expires_at: SystemTime,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Short provider name reported by `/health`.
    fn kind(&self) -> &'static str;

    /// Create an account and open its first session.
    async fn register_credentials(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SessionToken, AuthError>;

    /// Verify credentials and open a new session.
    async fn authenticate(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SessionToken, AuthError>;

    /// Confirm a token was issued by this provider and is still live.
    async fn validate_session(&self, token: &str) -> Result<SessionInfo, AuthError>;

    /// Drop a session. Unknown tokens are ignored.
    async fn revoke_session(&self, token: &str) -> Result<(), AuthError>;

    /// Remove expired sessions, returning how many were dropped.
    async fn purge_expired(&self) -> Result<usize, AuthError> {
        Ok(0)
    }
}
