use clap::{
    builder::{PossibleValuesParser, TypedValueParser, ValueParser},
    Arg, ArgMatches, Command,
};

pub const ARG_VERBOSITY: &str = "verbosity";
pub const ARG_LOG_FORMAT: &str = "log-format";

/// Output format of the log lines written to stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Log format selected on the command line, text when absent.
#[must_use]
pub fn log_format(matches: &ArgMatches) -> LogFormat {
    matches
        .get_one::<LogFormat>(ARG_LOG_FORMAT)
        .copied()
        .unwrap_or_default()
}

#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_VERBOSITY)
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("SCREENER_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .arg(
            Arg::new(ARG_LOG_FORMAT)
                .long("log-format")
                .help("Log output format")
                .env("SCREENER_LOG_FORMAT")
                .default_value("text")
                .global(true)
                .value_parser(PossibleValuesParser::new(["text", "json"]).map(|format| {
                    if format == "json" {
                        LogFormat::Json
                    } else {
                        LogFormat::Text
                    }
                })),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<ArgMatches, clap::Error> {
        with_args(Command::new("screener")).try_get_matches_from(args)
    }

    #[test]
    fn log_format_defaults_to_text() {
        temp_env::with_vars([("SCREENER_LOG_FORMAT", None::<&str>)], || {
            let format = parse(&["screener"]).map(|m| log_format(&m));
            assert_eq!(format.ok(), Some(LogFormat::Text));
        });
    }

    #[test]
    fn log_format_from_flag_and_env() {
        temp_env::with_vars([("SCREENER_LOG_FORMAT", Some("json"))], || {
            let format = parse(&["screener"]).map(|m| log_format(&m));
            assert_eq!(format.ok(), Some(LogFormat::Json));
        });
        temp_env::with_vars([("SCREENER_LOG_FORMAT", None::<&str>)], || {
            let format = parse(&["screener", "--log-format", "json"]).map(|m| log_format(&m));
            assert_eq!(format.ok(), Some(LogFormat::Json));
            assert!(parse(&["screener", "--log-format", "xml"]).is_err());
        });
    }

    #[test]
    fn numeric_log_levels_are_accepted() {
        temp_env::with_vars([("SCREENER_LOG_LEVEL", Some("3"))], || {
            let level = parse(&["screener"]).map(|m| m.get_one::<u8>(ARG_VERBOSITY).copied());
            assert_eq!(level.ok(), Some(Some(3)));
        });
    }
}
