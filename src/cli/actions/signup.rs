use crate::provider::{outcome_message, AuthProvider};
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};

#[derive(Debug)]
pub struct Args {
    pub provider_url: String,
    pub provider_key: SecretString,
    pub email: String,
    pub password: SecretString,
}

/// Execute the sign-up action and print the status message.
///
/// # Errors
/// Returns an error if the provider client cannot be built or the provider
/// rejects the sign-up, after the status message has been printed.
pub async fn execute(args: Args) -> Result<()> {
    let provider = AuthProvider::new(&args.provider_url, args.provider_key)
        .context("Failed to configure the authentication provider")?;

    let outcome = provider
        .sign_up(&args.email, args.password.expose_secret())
        .await;

    println!("{}", outcome_message(&outcome));

    outcome.map(|_| ()).context("Sign-up rejected")
}
