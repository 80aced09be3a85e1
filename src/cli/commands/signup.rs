use crate::provider::{DEFAULT_EMAIL, DEFAULT_PASSWORD};
use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const COMMAND: &str = "signup";
pub const ARG_PROVIDER_URL: &str = "provider-url";
pub const ARG_PROVIDER_KEY: &str = "provider-key";
pub const ARG_EMAIL: &str = "email";
pub const ARG_PASSWORD: &str = "password";

#[must_use]
pub fn command() -> Command {
    Command::new(COMMAND)
        .about("Register an account with the hosted authentication provider")
        .arg(
            Arg::new(ARG_PROVIDER_URL)
                .long("provider-url")
                .help("Base URL of the authentication provider, example: https://project.supabase.co")
                .env("AUTH_PROVIDER_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_PROVIDER_KEY)
                .long("provider-key")
                .help("Public API key of the authentication provider")
                .env("AUTH_PROVIDER_KEY")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_EMAIL)
                .long("email")
                .help("Email to register")
                .default_value(DEFAULT_EMAIL),
        )
        .arg(
            Arg::new(ARG_PASSWORD)
                .long("password")
                .help("Password to register")
                .default_value(DEFAULT_PASSWORD),
        )
}

#[derive(Debug)]
pub struct Options {
    pub provider_url: String,
    pub provider_key: SecretString,
    pub email: String,
    pub password: SecretString,
}

impl Options {
    /// Extract sign-up options from the subcommand matches.
    /// # Errors
    /// Returns an error if a required value is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let string = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .with_context(|| format!("missing required argument: --{id}"))
        };

        Ok(Self {
            provider_url: string(ARG_PROVIDER_URL)?,
            provider_key: SecretString::from(string(ARG_PROVIDER_KEY)?),
            email: string(ARG_EMAIL)?,
            password: SecretString::from(string(ARG_PASSWORD)?),
        })
    }
}
