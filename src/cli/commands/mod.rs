pub mod logging;
pub mod provider;

use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};

use crate::config::{DEFAULT_ALLOWED_ORIGIN, DEFAULT_LISTEN_PORT};

pub const ARG_PORT: &str = "port";
pub const ARG_FRONTEND_ORIGIN: &str = "frontend-origin";

/// Port parser that never rejects: anything that is not a non-zero `u16`
/// becomes the default port.
#[must_use]
pub fn lenient_port() -> ValueParser {
    ValueParser::from(move |value: &str| -> std::result::Result<u16, String> {
        Ok(value
            .trim()
            .parse::<u16>()
            .ok()
            .filter(|port| *port != 0)
            .unwrap_or(DEFAULT_LISTEN_PORT))
    })
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("authgate")
        .about("Authentication gateway")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("3001")
                .env("AUTH_SERVICE_PORT")
                .value_parser(lenient_port()),
        )
        .arg(
            Arg::new(ARG_FRONTEND_ORIGIN)
                .long(ARG_FRONTEND_ORIGIN)
                .help("The single browser origin allowed to call the API")
                .default_value(DEFAULT_ALLOWED_ORIGIN)
                .env("FRONTEND_ORIGIN"),
        );

    let command = provider::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port_from(args: Vec<&str>) -> Option<u16> {
        new().get_matches_from(args).get_one::<u16>(ARG_PORT).copied()
    }

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "authgate");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Authentication gateway".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_port_defaults() {
        temp_env::with_var_unset("AUTH_SERVICE_PORT", || {
            assert_eq!(port_from(vec!["authgate"]), Some(3001));
        });
    }

    #[test]
    fn test_port_from_env() {
        temp_env::with_var("AUTH_SERVICE_PORT", Some("8443"), || {
            assert_eq!(port_from(vec!["authgate"]), Some(8443));
        });
    }

    #[test]
    fn test_port_falls_back_when_unusable() {
        for value in ["abc", "0", "", "70000", "-1"] {
            temp_env::with_var("AUTH_SERVICE_PORT", Some(value), || {
                assert_eq!(port_from(vec!["authgate"]), Some(3001), "{value:?}");
            });
        }
    }

    #[test]
    fn test_port_flag_overrides_env() {
        temp_env::with_var("AUTH_SERVICE_PORT", Some("9000"), || {
            assert_eq!(port_from(vec!["authgate", "--port", "9100"]), Some(9100));
        });
    }

    #[test]
    fn test_frontend_origin_env() {
        temp_env::with_var("FRONTEND_ORIGIN", Some("https://app.example.com"), || {
            let matches = new().get_matches_from(vec!["authgate"]);
            assert_eq!(
                matches
                    .get_one::<String>(ARG_FRONTEND_ORIGIN)
                    .map(String::as_str),
                Some("https://app.example.com")
            );
        });
    }

    #[test]
    fn test_verbosity_from_env() {
        temp_env::with_var("AUTH_LOG_LEVEL", Some("info"), || {
            let matches = new().get_matches_from(vec!["authgate"]);
            assert_eq!(
                matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                Some(2)
            );
        });
    }

    #[test]
    fn test_verbosity_flags() {
        temp_env::with_var_unset("AUTH_LOG_LEVEL", || {
            let matches = new().get_matches_from(vec!["authgate", "-vvv"]);
            assert_eq!(
                matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                Some(3)
            );
        });
    }
}
