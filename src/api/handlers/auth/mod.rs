//! Auth handlers and supporting modules.
//!
//! Accounts are local: usernames and emails are unique, passwords are stored
//! as Argon2id PHC strings.
//!
//! ## Sessions
//!
//! Register and login open a session and return its token twice: in the
//! `screener_session` cookie (`HttpOnly`, `SameSite=Lax`) and in the JSON
//! body for clients that prefer `Authorization: Bearer`. The database only
//! keeps an HMAC-SHA256 digest of the token keyed by `SECRET_KEY`, so
//! rotating the key logs every user out.

pub(crate) mod login;
pub(crate) mod register;
pub(crate) mod session;
mod state;
mod storage;
pub(crate) mod types;
mod utils;

use axum::{
    routing::{get, post},
    Router,
};

pub(crate) use session::authenticate_session;
pub use state::{AuthConfig, AuthState, DEFAULT_SESSION_TTL_SECONDS};

/// Routes mounted under `/api/auth`.
pub fn router() -> Router {
    Router::new()
        .route("/api/auth", get(session::status))
        .route("/api/auth/register", post(register::register))
        .route("/api/auth/login", post(login::login))
        .route("/api/auth/logout", post(session::logout))
}

#[cfg(test)]
mod tests;
