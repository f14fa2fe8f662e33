//! Identity provider arguments.

use anyhow::{Context, Result};
use clap::{builder::BoolishValueParser, Arg, ArgAction, Command};
use std::time::Duration;

use crate::config::IdentityProviderSetting;
use crate::identity::ProviderConfig;

pub const ARG_DISABLE_PROVIDER: &str = "disable-identity-provider";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_MAX_FAILED_ATTEMPTS: &str = "max-failed-attempts";
pub const ARG_LOCKOUT_SECONDS: &str = "lockout-seconds";
pub const ARG_PROVIDER_TIMEOUT_MS: &str = "provider-timeout-ms";
pub const ARG_ARGON2_MEMORY_KIB: &str = "argon2-memory-kib";
pub const ARG_ARGON2_ITERATIONS: &str = "argon2-iterations";
pub const ARG_ARGON2_PARALLELISM: &str = "argon2-parallelism";

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = with_session_args(command);
    with_hashing_args(command)
}

fn with_session_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_DISABLE_PROVIDER)
                .long(ARG_DISABLE_PROVIDER)
                .help("Run without an identity provider, serving liveness only")
                .env("AUTH_IDENTITY_PROVIDER_DISABLED")
                .action(ArgAction::SetTrue)
                .value_parser(BoolishValueParser::new()),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session token TTL in seconds")
                .env("AUTH_SESSION_TTL_SECONDS")
                .default_value("86400")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_MAX_FAILED_ATTEMPTS)
                .long(ARG_MAX_FAILED_ATTEMPTS)
                .help("Consecutive failed logins before an account is locked")
                .env("AUTH_MAX_FAILED_ATTEMPTS")
                .default_value("5")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_LOCKOUT_SECONDS)
                .long(ARG_LOCKOUT_SECONDS)
                .help("How long a locked account stays locked, in seconds")
                .env("AUTH_LOCKOUT_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_PROVIDER_TIMEOUT_MS)
                .long(ARG_PROVIDER_TIMEOUT_MS)
                .help("Timeout for each identity provider operation, in milliseconds")
                .env("AUTH_PROVIDER_TIMEOUT_MS")
                .default_value("5000")
                .value_parser(clap::value_parser!(u64)),
        )
}

fn with_hashing_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ARGON2_MEMORY_KIB)
                .long(ARG_ARGON2_MEMORY_KIB)
                .help("Argon2id memory cost in KiB")
                .env("AUTH_ARGON2_MEMORY_KIB")
                .default_value("19456")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_ARGON2_ITERATIONS)
                .long(ARG_ARGON2_ITERATIONS)
                .help("Argon2id iterations")
                .env("AUTH_ARGON2_ITERATIONS")
                .default_value("2")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_ARGON2_PARALLELISM)
                .long(ARG_ARGON2_PARALLELISM)
                .help("Argon2id parallelism (lanes)")
                .env("AUTH_ARGON2_PARALLELISM")
                .default_value("1")
                .value_parser(clap::value_parser!(u32)),
        )
}

#[derive(Debug)]
pub struct Options {
    pub setting: IdentityProviderSetting,
}

impl Options {
    /// Build the provider setting from validated matches.
    ///
    /// Values are passed through unchecked; the supervisor rejects unusable ones at boot.
    ///
    /// # Errors
    /// Returns an error if a defaulted argument is unexpectedly missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        if matches.get_flag(ARG_DISABLE_PROVIDER) {
            return Ok(Self {
                setting: IdentityProviderSetting::Disabled,
            });
        }

        let get_u64 = |name: &str| {
            matches
                .get_one::<u64>(name)
                .copied()
                .with_context(|| format!("missing required argument: --{name}"))
        };
        let get_u32 = |name: &str| {
            matches
                .get_one::<u32>(name)
                .copied()
                .with_context(|| format!("missing required argument: --{name}"))
        };

        let config = ProviderConfig::default()
            .with_session_ttl(Duration::from_secs(get_u64(ARG_SESSION_TTL_SECONDS)?))
            .with_max_failed_attempts(get_u32(ARG_MAX_FAILED_ATTEMPTS)?)
            .with_lockout_duration(Duration::from_secs(get_u64(ARG_LOCKOUT_SECONDS)?))
            .with_operation_timeout(Duration::from_millis(get_u64(ARG_PROVIDER_TIMEOUT_MS)?))
            .with_argon2_params(
                get_u32(ARG_ARGON2_MEMORY_KIB)?,
                get_u32(ARG_ARGON2_ITERATIONS)?,
                get_u32(ARG_ARGON2_PARALLELISM)?,
            );

        Ok(Self {
            setting: IdentityProviderSetting::Memory(config),
        })
    }
}
