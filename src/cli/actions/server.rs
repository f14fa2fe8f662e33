use crate::{
    api,
    cli::telemetry,
    config::{normalize_origin, IdentityProviderSetting, ServiceConfiguration},
    identity,
};
use anyhow::{Context, Result};
use tracing::{debug, info};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub frontend_origin: String,
    pub identity_provider: IdentityProviderSetting,
}

/// Build the configuration from CLI arguments.
///
/// # Errors
/// Returns an error if the frontend origin is not a valid absolute URL.
pub fn configuration(args: Args) -> Result<ServiceConfiguration> {
    let origin = normalize_origin(&args.frontend_origin)
        .with_context(|| format!("Invalid FRONTEND_ORIGIN: {}", args.frontend_origin))?;

    Ok(ServiceConfiguration::default()
        .with_listen_port(args.port)
        .with_allowed_origin(origin)
        .with_identity_provider(args.identity_provider))
}

/// Execute the server action.
///
/// The identity provider is initialized before the socket is bound; a
/// failure here ends the process without ever listening.
///
/// # Errors
/// Returns an error if configuration is invalid, the provider fails to
/// initialize, or the server fails.
pub async fn execute(args: Args) -> Result<()> {
    api::lifecycle::install_panic_hook();

    let config = configuration(args)?;
    debug!("Service configuration: {:?}", config);

    let mode = identity::initialize(&config).context("Identity provider initialization failed")?;
    info!(mode = mode.as_str(), "Operating mode decided");

    let result = api::new(&config, mode).await;

    telemetry::shutdown_tracer();

    result
}
