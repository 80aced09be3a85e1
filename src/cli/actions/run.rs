use crate::cli::actions::{import, server, signup, Action};
use anyhow::Result;

/// Execute the provided action.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Server(args) => server::execute(args).await,
        Action::Signup(args) => signup::execute(args).await,
        Action::Import(args) => import::execute(args).await,
    }
}
