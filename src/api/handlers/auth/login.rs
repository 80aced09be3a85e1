use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use sqlx::AnyPool;
use std::sync::Arc;
use tracing::{debug, error, instrument};

use super::{
    session::start_session,
    state::AuthState,
    storage::find_user_for_login,
    types::{LoginRequest, UserEnvelope},
    utils::{verify_password, verify_unknown_login},
};
use crate::api::handlers::{error_response, ErrorResponse};

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session opened", body = UserEnvelope),
        (status = 400, description = "Missing fields", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
    ),
    tag = "auth"
)]
#[instrument(skip(pool, auth_state, payload))]
pub async fn login(
    pool: Extension<AnyPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Requête invalide");
    };

    if request.username.trim().is_empty() || request.password.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Veuillez remplir tous les champs");
    }

    let user = match find_user_for_login(&pool, &request.username).await {
        Ok(user) => user,
        Err(err) => {
            error!("Failed to lookup user: {err}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Erreur interne");
        }
    };

    // Unknown logins pay the same Argon2 cost as a wrong password.
    let password = request.password;
    let stored_hash = user.as_ref().map(|user| user.password_hash.clone());
    let verified = match tokio::task::spawn_blocking(move || match stored_hash {
        Some(stored_hash) => verify_password(&password, &stored_hash),
        None => verify_unknown_login(&password),
    })
    .await
    {
        Ok(verified) => verified,
        Err(err) => {
            error!("Password verification task failed: {err}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Erreur interne");
        }
    };

    match user {
        Some(user) if verified => start_session(&pool, &auth_state, user, StatusCode::OK).await,
        Some(_) => {
            debug!("Password mismatch");
            error_response(StatusCode::UNAUTHORIZED, "Identifiants invalides")
        }
        None => {
            debug!("Unknown login");
            error_response(StatusCode::UNAUTHORIZED, "Identifiants invalides")
        }
    }
}
