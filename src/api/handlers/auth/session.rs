//! Session endpoints for cookie and bearer auth.

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use sqlx::AnyPool;
use std::sync::Arc;
use tracing::error;

use super::{
    state::{AuthConfig, AuthState},
    storage::{delete_session, insert_session, lookup_session, SessionUser, UserRecord},
    types::{UserEnvelope, UserResponse},
    utils::{generate_session_token, hash_session_token},
};
use crate::api::handlers::{error_response, MessageResponse};

pub const SESSION_COOKIE_NAME: &str = "screener_session";

#[utoipa::path(
    get,
    path = "/api/auth",
    responses(
        (status = 200, description = "Current user, or null without a valid session", body = UserEnvelope),
        (status = 500, description = "Session lookup failed", body = crate::api::handlers::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn status(
    headers: HeaderMap,
    pool: Extension<AnyPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    match authenticate_session(&headers, &pool, &auth_state).await {
        Ok(user) => {
            let user = user.map(|session| UserResponse {
                id: session.user_id,
                username: session.username,
                email: session.email,
                token: None,
            });
            (StatusCode::OK, Json(UserEnvelope { user })).into_response()
        }
        Err(status) => error_response(status, "Erreur lors de la vérification de la session"),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Session cleared", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn logout(
    headers: HeaderMap,
    pool: Extension<AnyPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    if let Some(token) = extract_session_token(&headers) {
        match hash_session_token(auth_state.config().secret_key(), &token) {
            Ok(token_hash) => {
                if let Err(err) = delete_session(&pool, &token_hash).await {
                    error!("Failed to delete session: {err}");
                }
            }
            Err(err) => error!("Failed to hash session token: {err}"),
        }
    }

    // Always clear the cookie, even if the session record was missing.
    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = clear_session_cookie(auth_state.config()) {
        response_headers.insert(SET_COOKIE, cookie);
    }
    (
        StatusCode::OK,
        response_headers,
        Json(MessageResponse {
            message: "Déconnexion réussie".to_string(),
        }),
    )
        .into_response()
}

/// Resolve the request's session token into its user.
///
/// Returns `Ok(None)` when no token is presented or it is unknown or expired.
pub(crate) async fn authenticate_session(
    headers: &HeaderMap,
    pool: &AnyPool,
    auth_state: &AuthState,
) -> Result<Option<SessionUser>, StatusCode> {
    let Some(token) = extract_session_token(headers) else {
        return Ok(None);
    };
    let token_hash = hash_session_token(auth_state.config().secret_key(), &token).map_err(|err| {
        error!("Failed to hash session token: {err}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    lookup_session(pool, &token_hash).await.map_err(|err| {
        error!("Failed to lookup session: {err}");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Open a session for `user` and build the register/login response.
pub(super) async fn start_session(
    pool: &AnyPool,
    auth_state: &AuthState,
    user: UserRecord,
    status: StatusCode,
) -> Response {
    let config = auth_state.config();
    let issued = generate_session_token().and_then(|token| {
        let token_hash = hash_session_token(config.secret_key(), &token)?;
        Ok((token, token_hash))
    });
    let (token, token_hash) = match issued {
        Ok(pair) => pair,
        Err(err) => {
            error!("Failed to create session token: {err}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Erreur interne");
        }
    };

    let ttl_seconds = config.session_ttl_seconds();
    if let Err(err) = insert_session(pool, &token_hash, &user.id, ttl_seconds).await {
        error!("Failed to store session: {err}");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Erreur interne");
    }

    let mut headers = HeaderMap::new();
    match session_cookie(config, &token) {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => error!("Failed to build session cookie: {err}"),
    }

    let body = UserEnvelope {
        user: Some(UserResponse {
            id: user.id,
            username: user.username,
            email: user.email,
            token: Some(token),
        }),
    };
    (status, headers, Json(body)).into_response()
}

fn session_cookie(
    config: &AuthConfig,
    token: &str,
) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
    let ttl_seconds = config.session_ttl_seconds();
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_session_cookie(
    config: &AuthConfig,
) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Bearer tokens win over the cookie.
fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            if let Some((key, val)) = pair.trim().split_once('=') {
                if key.trim() == SESSION_COOKIE_NAME && !val.trim().is_empty() {
                    return Some(val.trim().to_string());
                }
            }
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
