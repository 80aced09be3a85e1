//! # Screener (Screening Actions API)
//!
//! `screener` serves the stock screening API behind the Screening Actions web
//! application. It covers the Eurostoxx 600 and S&P 500 universes and ranks
//! stocks by how far they trade below their 52-week high.
//!
//! ## Route Groups
//!
//! - **Screening** is mounted under `/api`: search, index listing, stock
//!   lookup and per-user saved searches.
//! - **Auth** is mounted under `/api/auth`: register, login, logout and
//!   session status. Sessions are carried by the `screener_session` cookie or
//!   an `Authorization: Bearer` header.
//!
//! ## Storage
//!
//! `DATABASE_URL` selects SQLite or Postgres at runtime. When it is unset the
//! server uses a local `screening_actions.db` SQLite file. Tables are created
//! on startup.
//!
//! ## Sign-up Client
//!
//! `screener signup` exercises the sign-up endpoint of a hosted
//! authentication provider and prints a French status message.

pub mod api;
pub mod cli;
pub mod db;
pub mod provider;
pub mod stocks;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
