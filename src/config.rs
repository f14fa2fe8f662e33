//! Process-wide service configuration, built once at startup and never mutated.

use anyhow::{anyhow, Context, Result};
use url::Url;

use crate::identity::ProviderConfig;

pub const DEFAULT_LISTEN_PORT: u16 = 3001;
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";

/// Which identity provider the supervisor should build.
#[derive(Clone, Debug)]
pub enum IdentityProviderSetting {
    /// Deployment intentionally runs without identity operations.
    Disabled,
    Memory(ProviderConfig),
}

#[derive(Clone, Debug)]
pub struct ServiceConfiguration {
    listen_port: u16,
    allowed_origin: String,
    identity_provider: IdentityProviderSetting,
}

impl Default for ServiceConfiguration {
    fn default() -> Self {
        Self {
            listen_port: DEFAULT_LISTEN_PORT,
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            identity_provider: IdentityProviderSetting::Memory(ProviderConfig::default()),
        }
    }
}

impl ServiceConfiguration {
    #[must_use]
    pub fn with_listen_port(mut self, port: u16) -> Self {
        self.listen_port = port;
        self
    }

    #[must_use]
    pub fn with_allowed_origin(mut self, origin: String) -> Self {
        self.allowed_origin = origin;
        self
    }

    #[must_use]
    pub fn with_identity_provider(mut self, setting: IdentityProviderSetting) -> Self {
        self.identity_provider = setting;
        self
    }

    #[must_use]
    pub fn listen_port(&self) -> u16 {
        self.listen_port
    }

    #[must_use]
    pub fn allowed_origin(&self) -> &str {
        &self.allowed_origin
    }

    /// Credentialed cross-origin access is always granted to the allowed origin.
    #[must_use]
    pub const fn credentials_allowed(&self) -> bool {
        true
    }

    #[must_use]
    pub fn identity_provider(&self) -> &IdentityProviderSetting {
        &self.identity_provider
    }
}

/// Reduce a configured frontend URL to the `scheme://host[:port]` form browsers
/// send in the `Origin` header.
///
/// # Errors
/// Returns an error if the value is not an absolute URL with a host.
pub fn normalize_origin(origin: &str) -> Result<String> {
    let parsed =
        Url::parse(origin.trim()).with_context(|| format!("Invalid frontend origin: {origin}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("Frontend origin must include a valid host: {origin}"))?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    Ok(format!("{}://{}{}", parsed.scheme(), host, port))
}
