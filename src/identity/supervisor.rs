//! Boot-time construction of the identity provider and the operating mode decision.

use std::{fmt, sync::Arc};
use tracing::{error, info, warn};

use super::{IdentityProviderHandle, InitError, MemoryIdentityProvider, ProviderConfig};
use crate::config::{IdentityProviderSetting, ServiceConfiguration};

/// Decided once before the listener opens; never changes afterwards.
#[derive(Clone)]
pub enum OperatingMode {
    /// Identity provider built; the full auth API is served.
    Active(IdentityProviderHandle),
    /// Identity provider disabled; only liveness is served.
    Degraded,
}

impl OperatingMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active(_) => "active",
            Self::Degraded => "degraded",
        }
    }

    #[must_use]
    pub fn provider(&self) -> Option<&IdentityProviderHandle> {
        match self {
            Self::Active(provider) => Some(provider),
            Self::Degraded => None,
        }
    }
}

impl fmt::Debug for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active(provider) => f.debug_tuple("Active").field(&provider.kind()).finish(),
            Self::Degraded => f.write_str("Degraded"),
        }
    }
}

/// Build the bundled identity provider from the service configuration.
///
/// # Errors
/// Returns [`InitError`] if the provider cannot be constructed. Callers must
/// treat this as fatal and never open the listening socket.
pub fn initialize(config: &ServiceConfiguration) -> Result<OperatingMode, InitError> {
    initialize_with(config, |provider_config| {
        let provider = MemoryIdentityProvider::new(provider_config.clone())?;
        Ok(Arc::new(provider) as IdentityProviderHandle)
    })
}

/// Same as [`initialize`] with a caller-supplied provider builder.
///
/// # Errors
/// Returns whatever the builder reports.
pub fn initialize_with<F>(config: &ServiceConfiguration, build: F) -> Result<OperatingMode, InitError>
where
    F: FnOnce(&ProviderConfig) -> Result<IdentityProviderHandle, InitError>,
{
    let provider_config = match config.identity_provider() {
        IdentityProviderSetting::Disabled => {
            warn!("identity provider disabled, serving liveness only");
            return Ok(OperatingMode::Degraded);
        }
        IdentityProviderSetting::Memory(provider_config) => provider_config,
    };

    match build(provider_config) {
        Ok(provider) => {
            info!(provider = provider.kind(), "identity provider initialized");
            Ok(OperatingMode::Active(provider))
        }
        Err(err) => {
            error!("identity provider initialization failed: {err}");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::test_provider_config;
    use anyhow::Result;

    #[test]
    fn disabled_provider_is_degraded_not_an_error() -> Result<()> {
        let config = ServiceConfiguration::default()
            .with_identity_provider(IdentityProviderSetting::Disabled);
        let mode = initialize_with(&config, |_| {
            Err(InitError::BackendUnavailable("must not be called".to_string()))
        })?;
        assert!(matches!(mode, OperatingMode::Degraded));
        assert!(mode.provider().is_none());
        assert_eq!(mode.as_str(), "degraded");
        Ok(())
    }

    #[test]
    fn memory_provider_is_active() -> Result<()> {
        let config = ServiceConfiguration::default()
            .with_identity_provider(IdentityProviderSetting::Memory(test_provider_config()));
        let mode = initialize(&config)?;
        assert_eq!(mode.as_str(), "active");
        assert_eq!(mode.provider().map(|p| p.kind()), Some("memory"));
        Ok(())
    }

    #[test]
    fn unreachable_backend_is_fatal() {
        let config = ServiceConfiguration::default();
        let result = initialize_with(&config, |_| {
            Err(InitError::BackendUnavailable("connection refused".to_string()))
        });
        assert!(matches!(result, Err(InitError::BackendUnavailable(_))));
    }

    #[test]
    fn malformed_provider_configuration_is_fatal() {
        let config = ServiceConfiguration::default().with_identity_provider(
            IdentityProviderSetting::Memory(ProviderConfig::default().with_argon2_params(0, 0, 0)),
        );
        let result = initialize(&config);
        assert!(matches!(result, Err(InitError::InvalidConfiguration(_))));
    }
}
