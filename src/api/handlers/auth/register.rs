use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use sqlx::AnyPool;
use std::sync::Arc;
use tracing::{error, info, instrument};

use super::{
    session::start_session,
    state::AuthState,
    storage::{insert_user, SignupOutcome},
    types::{RegisterRequest, UserEnvelope},
    utils::{hash_password, normalize_email, valid_email, valid_password, valid_username},
};
use crate::api::handlers::{error_response, ErrorResponse};

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created and session opened", body = UserEnvelope),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 409, description = "Username or email already taken", body = ErrorResponse),
    ),
    tag = "auth"
)]
#[instrument(skip(pool, auth_state, payload))]
pub async fn register(
    pool: Extension<AnyPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Requête invalide");
    };

    let username = request.username.trim().to_string();
    let email = normalize_email(&request.email);

    if username.is_empty() || email.is_empty() || request.password.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Veuillez remplir tous les champs");
    }
    if !valid_username(&username) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Nom d'utilisateur invalide (3 à 32 caractères)",
        );
    }
    if !valid_email(&email) {
        return error_response(StatusCode::BAD_REQUEST, "Email invalide");
    }
    if !valid_password(&request.password) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Le mot de passe doit contenir au moins 8 caractères",
        );
    }

    // Argon2 is CPU bound.
    let password = request.password;
    let password_hash = match tokio::task::spawn_blocking(move || hash_password(&password)).await
    {
        Ok(Ok(hash)) => hash,
        Ok(Err(err)) => {
            error!("Failed to hash password: {err}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Erreur interne");
        }
        Err(err) => {
            error!("Password hashing task failed: {err}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Erreur interne");
        }
    };

    match insert_user(&pool, &username, &email, &password_hash).await {
        Ok(SignupOutcome::Created(user)) => {
            info!(user_id = %user.id, "User registered");
            start_session(&pool, &auth_state, user, StatusCode::CREATED).await
        }
        Ok(SignupOutcome::Conflict) => error_response(
            StatusCode::CONFLICT,
            "Nom d'utilisateur ou email déjà utilisé",
        ),
        Err(err) => {
            error!("Failed to insert user: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Erreur interne")
        }
    }
}
