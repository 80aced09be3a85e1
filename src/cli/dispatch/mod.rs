//! Map parsed CLI arguments to an [`Action`].

use crate::cli::actions::{import, server, signup, Action};
use crate::cli::commands::{self, import as import_cmd, signup as signup_cmd};
use anyhow::{Context, Result};

/// Map validated CLI matches to an action. No subcommand means "run the server".
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some((signup_cmd::COMMAND, sub_m)) => {
            let options = signup_cmd::Options::parse(sub_m)?;
            Ok(Action::Signup(signup::Args {
                provider_url: options.provider_url,
                provider_key: options.provider_key,
                email: options.email,
                password: options.password,
            }))
        }
        Some((import_cmd::COMMAND, sub_m)) => Ok(Action::Import(import::Args {
            database_url: commands::server::database_url(sub_m)?,
            file: import_cmd::file(sub_m)?,
        })),
        Some((name, _)) => Err(anyhow::anyhow!("unknown command: {name}")),
        None => {
            let options = commands::server::Options::parse(matches)
                .context("invalid server arguments")?;
            Ok(Action::Server(server::Args {
                port: options.port,
                host: options.host,
                database_url: options.database_url,
                secret_key: options.secret_key,
                session_ttl_seconds: options.session_ttl_seconds,
                secure_cookies: options.secure_cookies,
            }))
        }
    }
}
