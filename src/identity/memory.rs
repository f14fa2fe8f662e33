//! In-memory identity provider backed by Argon2id password hashes.
//!
//! Accounts and sessions live for the lifetime of the process. Only the
//! SHA-256 digest of a session token is stored, so a dump of the session table
//! cannot be replayed.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::{
    collections::{hash_map::Entry, HashMap},
    time::{Duration, Instant, SystemTime},
};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use super::utils::{
    check_credential_format, generate_session_token, hash_session_token, normalize_email,
};
use super::{AuthError, IdentityProvider, InitError, SessionInfo, SessionToken};

const DEFAULT_SESSION_TTL_SECONDS: u64 = 24 * 60 * 60;
const DEFAULT_MAX_FAILED_ATTEMPTS: u32 = 5;
const DEFAULT_LOCKOUT_SECONDS: u64 = 15 * 60;
const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 5_000;
// OWASP recommended Argon2id baseline: m=19456 KiB, t=2, p=1
const DEFAULT_ARGON2_MEMORY_KIB: u32 = 19_456;
const DEFAULT_ARGON2_ITERATIONS: u32 = 2;
const DEFAULT_ARGON2_PARALLELISM: u32 = 1;
const PROBE_PASSWORD: &str = "authgate-probe-password";

#[derive(Clone, Debug)]
pub struct ProviderConfig {
    session_ttl: Duration,
    max_failed_attempts: u32,
    lockout_duration: Duration,
    operation_timeout: Duration,
    argon2_memory_kib: u32,
    argon2_iterations: u32,
    argon2_parallelism: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECONDS),
            max_failed_attempts: DEFAULT_MAX_FAILED_ATTEMPTS,
            lockout_duration: Duration::from_secs(DEFAULT_LOCKOUT_SECONDS),
            operation_timeout: Duration::from_millis(DEFAULT_OPERATION_TIMEOUT_MS),
            argon2_memory_kib: DEFAULT_ARGON2_MEMORY_KIB,
            argon2_iterations: DEFAULT_ARGON2_ITERATIONS,
            argon2_parallelism: DEFAULT_ARGON2_PARALLELISM,
        }
    }
}

impl ProviderConfig {
    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_max_failed_attempts(mut self, attempts: u32) -> Self {
        self.max_failed_attempts = attempts;
        self
    }

    #[must_use]
    pub fn with_lockout_duration(mut self, duration: Duration) -> Self {
        self.lockout_duration = duration;
        self
    }

    #[must_use]
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_argon2_params(mut self, memory_kib: u32, iterations: u32, parallelism: u32) -> Self {
        self.argon2_memory_kib = memory_kib;
        self.argon2_iterations = iterations;
        self.argon2_parallelism = parallelism;
        self
    }

    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    #[must_use]
    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }

    fn argon2_params(&self) -> Result<Params, InitError> {
        Params::new(
            self.argon2_memory_kib,
            self.argon2_iterations,
            self.argon2_parallelism,
            None,
        )
        .map_err(|err| InitError::InvalidConfiguration(format!("argon2 parameters: {err}")))
    }
}

#[derive(Debug)]
struct Account {
    password_hash: String,
    failed_attempts: u32,
    locked_until: Option<Instant>,
}

impl Account {
    fn is_locked(&self, now: Instant) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }
}

#[derive(Debug, Clone)]
struct Session {
    email: String,
    issued_at: SystemTime,
    expires_at: SystemTime,
}

#[derive(Debug)]
pub struct MemoryIdentityProvider {
    config: ProviderConfig,
    params: Params,
    /// Hash verified against when the email is unknown, so both paths cost the same.
    dummy_hash: String,
    accounts: RwLock<HashMap<String, Account>>,
    /// Keyed by SHA-256 of the raw session token.
    sessions: RwLock<HashMap<Vec<u8>, Session>>,
}

impl MemoryIdentityProvider {
    /// Build the provider and prove the hashing backend works with the given parameters.
    ///
    /// # Errors
    /// Returns [`InitError::InvalidConfiguration`] for unusable limits or Argon2
    /// parameters, and [`InitError::BackendUnavailable`] if the probe hash fails.
    pub fn new(config: ProviderConfig) -> Result<Self, InitError> {
        if config.operation_timeout.is_zero() {
            return Err(InitError::InvalidConfiguration(
                "operation timeout must be greater than zero".to_string(),
            ));
        }
        if config.session_ttl.is_zero() {
            return Err(InitError::InvalidConfiguration(
                "session TTL must be greater than zero".to_string(),
            ));
        }
        if config.max_failed_attempts == 0 {
            return Err(InitError::InvalidConfiguration(
                "max failed attempts must be greater than zero".to_string(),
            ));
        }

        let params = config.argon2_params()?;
        let dummy_hash = hash_password(&params, PROBE_PASSWORD)
            .map_err(|err| InitError::BackendUnavailable(format!("probe hash failed: {err}")))?;

        info!(
            memory_kib = params.m_cost(),
            iterations = params.t_cost(),
            parallelism = params.p_cost(),
            "memory identity provider ready"
        );

        Ok(Self {
            config,
            params,
            dummy_hash,
            accounts: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
        })
    }

    /// Run CPU-bound hashing off the async workers, bounded by the operation timeout.
    async fn run_blocking<T, F>(&self, work: F) -> Result<T, AuthError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, AuthError> + Send + 'static,
    {
        let task = tokio::task::spawn_blocking(work);
        match tokio::time::timeout(self.config.operation_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(AuthError::Internal(format!(
                "hashing task failed: {join_err}"
            ))),
            Err(_) => {
                warn!(
                    timeout_ms = self.config.operation_timeout.as_millis(),
                    "identity operation timed out"
                );
                Err(AuthError::BackendTimeout)
            }
        }
    }

    async fn issue_session(&self, email: String) -> Result<SessionToken, AuthError> {
        let token = generate_session_token()?;
        let issued_at = SystemTime::now();
        let session = Session {
            email,
            issued_at,
            expires_at: issued_at + self.config.session_ttl,
        };
        self.sessions
            .write()
            .await
            .insert(hash_session_token(&token), session);
        Ok(SessionToken::new(token))
    }

    async fn record_failure(&self, email: &str) -> AuthError {
        let mut accounts = self.accounts.write().await;
        let Some(account) = accounts.get_mut(email) else {
            return AuthError::InvalidCredentials;
        };

        if account.is_locked(Instant::now()) {
            return AuthError::AccountLocked;
        }

        account.failed_attempts += 1;
        if account.failed_attempts >= self.config.max_failed_attempts {
            account.failed_attempts = 0;
            account.locked_until = Some(Instant::now() + self.config.lockout_duration);
            warn!(email, "account locked after repeated failed logins");
            return AuthError::AccountLocked;
        }

        AuthError::InvalidCredentials
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    fn kind(&self) -> &'static str {
        "memory"
    }

    #[instrument(skip(self, password))]
    async fn register_credentials(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SessionToken, AuthError> {
        let email_normalized = check_credential_format(email, password.expose_secret())?;

        if self.accounts.read().await.contains_key(&email_normalized) {
            return Err(AuthError::DuplicateAccount);
        }

        let params = self.params.clone();
        let raw = password.expose_secret().to_string();
        let password_hash = self
            .run_blocking(move || {
                hash_password(&params, &raw)
                    .map_err(|err| AuthError::Internal(format!("failed to hash password: {err}")))
            })
            .await?;

        match self.accounts.write().await.entry(email_normalized.clone()) {
            // Lost a race with a concurrent signup for the same email.
            Entry::Occupied(_) => return Err(AuthError::DuplicateAccount),
            Entry::Vacant(slot) => {
                slot.insert(Account {
                    password_hash,
                    failed_attempts: 0,
                    locked_until: None,
                });
            }
        }

        debug!(email = %email_normalized, "account registered");
        self.issue_session(email_normalized).await
    }

    #[instrument(skip(self, password))]
    async fn authenticate(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SessionToken, AuthError> {
        let email_normalized = normalize_email(email);

        let stored = {
            let accounts = self.accounts.read().await;
            match accounts.get(&email_normalized) {
                Some(account) if account.is_locked(Instant::now()) => {
                    return Err(AuthError::AccountLocked)
                }
                Some(account) => Some(account.password_hash.clone()),
                None => None,
            }
        };

        let known = stored.is_some();
        let hash = stored.unwrap_or_else(|| self.dummy_hash.clone());
        let raw = password.expose_secret().to_string();
        let matched = self
            .run_blocking(move || verify_password(&hash, &raw))
            .await?;

        if !known {
            return Err(AuthError::InvalidCredentials);
        }
        if !matched {
            return Err(self.record_failure(&email_normalized).await);
        }

        {
            let mut accounts = self.accounts.write().await;
            if let Some(account) = accounts.get_mut(&email_normalized) {
                // A concurrent attempt may have locked the account while we were hashing.
                if account.is_locked(Instant::now()) {
                    return Err(AuthError::AccountLocked);
                }
                account.failed_attempts = 0;
                account.locked_until = None;
            }
        }

        self.issue_session(email_normalized).await
    }

    async fn validate_session(&self, token: &str) -> Result<SessionInfo, AuthError> {
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(&hash_session_token(token))
            .ok_or(AuthError::InvalidCredentials)?;

        if session.expires_at <= SystemTime::now() {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(SessionInfo {
            email: session.email.clone(),
            issued_at: session.issued_at,
            expires_at: session.expires_at,
        })
    }

    async fn revoke_session(&self, token: &str) -> Result<(), AuthError> {
        self.sessions
            .write()
            .await
            .remove(&hash_session_token(token));
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, AuthError> {
        let now = SystemTime::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.expires_at > now);
        Ok(before - sessions.len())
    }
}

fn hash_password(params: &Params, password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone());
    Ok(argon2
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

fn verify_password(hash: &str, password: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|err| AuthError::Internal(format!("stored hash is malformed: {err}")))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(AuthError::Internal(format!(
            "password verification failed: {err}"
        ))),
    }
}
