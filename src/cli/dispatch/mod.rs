//! Maps validated CLI arguments to the action to run.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{provider, ARG_FRONTEND_ORIGIN, ARG_PORT};
use crate::config::DEFAULT_LISTEN_PORT;
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches
        .get_one::<u16>(ARG_PORT)
        .copied()
        .unwrap_or(DEFAULT_LISTEN_PORT);
    let frontend_origin = matches
        .get_one::<String>(ARG_FRONTEND_ORIGIN)
        .cloned()
        .context("missing required argument: --frontend-origin")?;

    let provider_opts = provider::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        frontend_origin,
        identity_provider: provider_opts.setting,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;
    use crate::config::IdentityProviderSetting;

    #[test]
    fn builds_server_action_from_env() -> Result<()> {
        temp_env::with_vars(
            [
                ("AUTH_SERVICE_PORT", Some("4000")),
                ("FRONTEND_ORIGIN", Some("https://app.example.com/")),
                ("AUTH_IDENTITY_PROVIDER_DISABLED", Some("true")),
            ],
            || {
                let matches = commands::new().get_matches_from(vec!["authgate"]);
                let Action::Server(args) = handler(&matches)?;
                assert_eq!(args.port, 4000);
                assert_eq!(args.frontend_origin, "https://app.example.com/");
                assert!(matches!(
                    args.identity_provider,
                    IdentityProviderSetting::Disabled
                ));
                Ok(())
            },
        )
    }

    #[test]
    fn defaults_to_memory_provider() -> Result<()> {
        temp_env::with_vars_unset(
            [
                "AUTH_SERVICE_PORT",
                "FRONTEND_ORIGIN",
                "AUTH_IDENTITY_PROVIDER_DISABLED",
            ],
            || {
                let matches = commands::new().get_matches_from(vec!["authgate"]);
                let Action::Server(args) = handler(&matches)?;
                assert_eq!(args.port, 3001);
                assert_eq!(args.frontend_origin, "http://localhost:5173");
                assert!(matches!(
                    args.identity_provider,
                    IdentityProviderSetting::Memory(_)
                ));
                Ok(())
            },
        )
    }
}
