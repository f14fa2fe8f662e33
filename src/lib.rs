//! # Authgate (Authentication Gateway)
//!
//! `authgate` exposes credential-based signup and login over HTTP for a browser
//! frontend, enforces a single-origin credentialed CORS policy, and owns its own
//! lifecycle.
//!
//! ## Operating Modes
//!
//! The mode is decided exactly once at boot, before the listening socket opens:
//!
//! - **Active:** an identity provider was built successfully and the full
//!   `/api/auth/*` surface is mounted.
//! - **Degraded:** the identity provider is disabled by configuration. Only the
//!   liveness endpoint answers; every other identity path returns `503`.
//!
//! If the identity provider fails to build, the process exits with a non-zero
//! status instead of serving a half-initialized identity surface.
//!
//! ## Identity Providers
//!
//! Credential verification and session issuance are delegated to an
//! [`identity::IdentityProvider`]. The bundled [`identity::MemoryIdentityProvider`]
//! hashes passwords with Argon2id and keeps only SHA-256 digests of issued
//! session tokens.

pub mod api;
pub mod cli;
pub mod config;
pub mod identity;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
