use super::Backend;
use anyhow::{Context, Result};
use sqlx::AnyPool;
use tracing::{info_span, Instrument};

fn statements(backend: Backend) -> Vec<String> {
    let (int, real) = match backend {
        Backend::Sqlite => ("INTEGER", "REAL"),
        Backend::Postgres => ("BIGINT", "DOUBLE PRECISION"),
    };

    vec![
        format!(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at {int} NOT NULL
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS sessions (
                token_hash TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at {int} NOT NULL,
                expires_at {int} NOT NULL
            )"
        ),
        "CREATE INDEX IF NOT EXISTS sessions_user_id_idx ON sessions (user_id)".to_string(),
        format!(
            "CREATE TABLE IF NOT EXISTS stocks (
                symbol TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                market_index TEXT NOT NULL,
                sector TEXT NOT NULL,
                country TEXT NOT NULL,
                currency TEXT NOT NULL,
                price {real} NOT NULL,
                high_52w {real} NOT NULL,
                low_52w {real},
                market_cap {real},
                pe_ratio {real},
                dividend_yield {real}
            )"
        ),
        "CREATE INDEX IF NOT EXISTS stocks_market_index_idx ON stocks (market_index)".to_string(),
        format!(
            "CREATE TABLE IF NOT EXISTS saved_searches (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                filters TEXT NOT NULL,
                created_at {int} NOT NULL
            )"
        ),
        "CREATE INDEX IF NOT EXISTS saved_searches_user_id_idx ON saved_searches (user_id)"
            .to_string(),
    ]
}

/// Create every table the API needs if it does not exist yet.
///
/// # Errors
/// Returns an error if any DDL statement fails.
pub async fn create_all(pool: &AnyPool, backend: Backend) -> Result<()> {
    for (index, statement) in statements(backend).iter().enumerate() {
        let span = info_span!(
            "db.query",
            db.system = backend.as_str(),
            db.operation = "CREATE"
        );
        sqlx::query(statement)
            .execute(pool)
            .instrument(span)
            .await
            .with_context(|| format!("failed to execute schema statement {}", index + 1))?;
    }

    Ok(())
}
