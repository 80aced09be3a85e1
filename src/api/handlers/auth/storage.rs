//! Database access for users and sessions.

use crate::db::{is_unique_violation, now_unix};
use sqlx::{AnyPool, Row};
use tracing::{info_span, Instrument};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub(crate) struct UserRecord {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// The user behind a valid session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SessionUser {
    pub user_id: String,
    pub username: String,
    pub email: String,
}

#[derive(Debug)]
pub(super) enum SignupOutcome {
    Created(UserRecord),
    Conflict,
}

pub(super) async fn insert_user(
    pool: &AnyPool,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<SignupOutcome, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let query = "INSERT INTO users (id, username, email, password_hash, created_at) \
                 VALUES ($1, $2, $3, $4, $5)";
    let span = info_span!("db.query", db.operation = "INSERT", db.statement = query);
    let result = sqlx::query(query)
        .bind(&id)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(now_unix())
        .execute(pool)
        .instrument(span)
        .await;

    match result {
        Ok(_) => Ok(SignupOutcome::Created(UserRecord {
            id,
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
        })),
        Err(err) if is_unique_violation(&err) => Ok(SignupOutcome::Conflict),
        Err(err) => Err(err),
    }
}

/// Find a user by username, or by email when `login` contains `@`.
pub(super) async fn find_user_for_login(
    pool: &AnyPool,
    login: &str,
) -> Result<Option<UserRecord>, sqlx::Error> {
    let (query, value) = if login.contains('@') {
        (
            "SELECT id, username, email, password_hash FROM users WHERE email = $1",
            login.trim().to_lowercase(),
        )
    } else {
        (
            "SELECT id, username, email, password_hash FROM users WHERE username = $1",
            login.trim().to_string(),
        )
    };
    let span = info_span!("db.query", db.operation = "SELECT", db.statement = query);
    let row = sqlx::query(query)
        .bind(value)
        .fetch_optional(pool)
        .instrument(span)
        .await?;

    row.map(|row| {
        Ok::<_, sqlx::Error>(UserRecord {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
        })
    })
    .transpose()
}

/// Store a session digest and drop sessions that already expired.
pub(super) async fn insert_session(
    pool: &AnyPool,
    token_hash: &str,
    user_id: &str,
    ttl_seconds: i64,
) -> Result<(), sqlx::Error> {
    let now = now_unix();

    let purge = "DELETE FROM sessions WHERE expires_at <= $1";
    let span = info_span!("db.query", db.operation = "DELETE", db.statement = purge);
    sqlx::query(purge)
        .bind(now)
        .execute(pool)
        .instrument(span)
        .await?;

    let query = "INSERT INTO sessions (token_hash, user_id, created_at, expires_at) \
                 VALUES ($1, $2, $3, $4)";
    let span = info_span!("db.query", db.operation = "INSERT", db.statement = query);
    sqlx::query(query)
        .bind(token_hash)
        .bind(user_id)
        .bind(now)
        .bind(now.saturating_add(ttl_seconds))
        .execute(pool)
        .instrument(span)
        .await?;

    Ok(())
}

pub(crate) async fn lookup_session(
    pool: &AnyPool,
    token_hash: &str,
) -> Result<Option<SessionUser>, sqlx::Error> {
    let query = "SELECT u.id, u.username, u.email FROM sessions s \
                 JOIN users u ON u.id = s.user_id \
                 WHERE s.token_hash = $1 AND s.expires_at > $2";
    let span = info_span!("db.query", db.operation = "SELECT", db.statement = query);
    let row = sqlx::query(query)
        .bind(token_hash)
        .bind(now_unix())
        .fetch_optional(pool)
        .instrument(span)
        .await?;

    row.map(|row| {
        Ok::<_, sqlx::Error>(SessionUser {
            user_id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
        })
    })
    .transpose()
}

pub(super) async fn delete_session(pool: &AnyPool, token_hash: &str) -> Result<(), sqlx::Error> {
    let query = "DELETE FROM sessions WHERE token_hash = $1";
    let span = info_span!("db.query", db.operation = "DELETE", db.statement = query);
    sqlx::query(query)
        .bind(token_hash)
        .execute(pool)
        .instrument(span)
        .await?;
    Ok(())
}
