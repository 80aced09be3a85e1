use crate::{
    api::{self, handlers::auth::AuthConfig},
    cli::commands::server::DEFAULT_SECRET_KEY,
    db::DatabaseUrl,
};
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub host: String,
    pub database_url: String,
    pub secret_key: SecretString,
    pub session_ttl_seconds: i64,
    pub secure_cookies: bool,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database URL is invalid, the database is unreachable or the server
/// fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let database_url = DatabaseUrl::parse(&args.database_url).context("Invalid DATABASE_URL")?;

    if args.secret_key.expose_secret() == DEFAULT_SECRET_KEY {
        warn!("SECRET_KEY is not set, using the built-in development key");
    }

    debug!(
        "Server args: host={} port={} database={} session_ttl_seconds={} secure_cookies={}",
        args.host,
        args.port,
        database_url.redacted(),
        args.session_ttl_seconds,
        args.secure_cookies
    );

    let auth_config = AuthConfig::new(args.secret_key)
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_session_cookie_secure(args.secure_cookies);

    api::new(&args.host, args.port, &database_url, auth_config).await
}
