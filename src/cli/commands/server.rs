use crate::{api::handlers::auth::DEFAULT_SESSION_TTL_SECONDS, db::DEFAULT_DATABASE_URL};
use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_PORT: &str = "port";
pub const ARG_HOST: &str = "host";
pub const ARG_DATABASE_URL: &str = "database-url";
pub const ARG_SECRET_KEY: &str = "secret-key";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_SECURE_COOKIES: &str = "secure-cookies";

/// Used when `SECRET_KEY` is unset; fine for local runs only.
pub const DEFAULT_SECRET_KEY: &str = "default-secret";

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("5000")
                .env("PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_HOST)
                .long("host")
                .help("Address to bind")
                .default_value("0.0.0.0")
                .env("HOST"),
        )
        .arg(
            Arg::new(ARG_DATABASE_URL)
                .short('d')
                .long("database-url")
                .help("Database URL (sqlite:///file.db, sqlite::memory:, postgres://...)")
                .default_value(DEFAULT_DATABASE_URL)
                .env("DATABASE_URL")
                .global(true),
        )
        .arg(
            Arg::new(ARG_SECRET_KEY)
                .long("secret-key")
                .help("Key used to sign session tokens")
                .default_value(DEFAULT_SECRET_KEY)
                .env("SECRET_KEY")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long("session-ttl-seconds")
                .help("Session lifetime in seconds")
                .default_value("604800")
                .env("SESSION_TTL_SECONDS")
                .value_parser(clap::value_parser!(i64).range(1..)),
        )
        .arg(
            Arg::new(ARG_SECURE_COOKIES)
                .long("secure-cookies")
                .help("Mark the session cookie Secure (serve over HTTPS)")
                .env("SESSION_COOKIE_SECURE")
                .action(ArgAction::SetTrue),
        )
}

#[derive(Debug)]
pub struct Options {
    pub port: u16,
    pub host: String,
    pub database_url: String,
    pub secret_key: SecretString,
    pub session_ttl_seconds: i64,
    pub secure_cookies: bool,
}

impl Options {
    /// Extract server options from CLI matches.
    /// # Errors
    /// Returns an error if a required value is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        Ok(Self {
            port: matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(5000),
            host: matches
                .get_one::<String>(ARG_HOST)
                .cloned()
                .context("missing required argument: --host")?,
            database_url: database_url(matches)?,
            secret_key: matches
                .get_one::<String>(ARG_SECRET_KEY)
                .map(|key| SecretString::from(key.as_str()))
                .context("missing required argument: --secret-key")?,
            session_ttl_seconds: matches
                .get_one::<i64>(ARG_SESSION_TTL_SECONDS)
                .copied()
                .unwrap_or(DEFAULT_SESSION_TTL_SECONDS),
            secure_cookies: matches.get_flag(ARG_SECURE_COOKIES),
        })
    }
}

/// `--database-url` is global, so subcommands read it from their own matches.
/// # Errors
/// Returns an error if the argument is missing.
pub fn database_url(matches: &ArgMatches) -> Result<String> {
    matches
        .get_one::<String>(ARG_DATABASE_URL)
        .cloned()
        .context("missing required argument: --database-url")
}
