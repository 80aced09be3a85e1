//! Per-user saved screening filters.
//!
//! Every endpoint needs a session. Searches belong to the user that created
//! them, another user's id answers 404.

mod storage;

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::AnyPool;
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;

use super::{
    auth::{authenticate_session, AuthState},
    error_response, ErrorResponse,
};
use crate::stocks::SearchFilters;

const MAX_NAME_CHARS: usize = 100;
const UNAUTHENTICATED: &str = "Authentification requise";

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SavedSearch {
    pub id: String,
    pub name: String,
    pub filters: SearchFilters,
    /// Unix seconds.
    pub created_at: i64,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct CreateSavedSearch {
    pub name: String,
    pub filters: SearchFilters,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SavedSearchList {
    pub searches: Vec<SavedSearch>,
}

#[utoipa::path(
    get,
    path = "/api/saved-searches",
    responses(
        (status = 200, description = "Saved searches of the current user, newest first", body = SavedSearchList),
        (status = 401, description = "No valid session", body = ErrorResponse),
    ),
    tag = "screening"
)]
pub async fn list(
    headers: HeaderMap,
    pool: Extension<AnyPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let user = match authenticate_session(&headers, &pool, &auth_state).await {
        Ok(Some(user)) => user,
        Ok(None) => return error_response(StatusCode::UNAUTHORIZED, UNAUTHENTICATED),
        Err(status) => return error_response(status, "Erreur interne"),
    };

    match storage::list_for_user(&pool, &user.user_id).await {
        Ok(searches) => (StatusCode::OK, Json(SavedSearchList { searches })).into_response(),
        Err(err) => {
            error!("Failed to list saved searches: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Erreur interne")
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/saved-searches",
    request_body = CreateSavedSearch,
    responses(
        (status = 201, description = "Search saved", body = SavedSearch),
        (status = 400, description = "Invalid name or filters", body = ErrorResponse),
        (status = 401, description = "No valid session", body = ErrorResponse),
    ),
    tag = "screening"
)]
#[instrument(skip(headers, pool, auth_state, payload))]
pub async fn create(
    headers: HeaderMap,
    pool: Extension<AnyPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<CreateSavedSearch>>,
) -> impl IntoResponse {
    let user = match authenticate_session(&headers, &pool, &auth_state).await {
        Ok(Some(user)) => user,
        Ok(None) => return error_response(StatusCode::UNAUTHORIZED, UNAUTHENTICATED),
        Err(status) => return error_response(status, "Erreur interne"),
    };

    let Some(Json(request)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Requête invalide");
    };

    let name = request.name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Le nom doit contenir entre 1 et 100 caractères",
        );
    }
    if let Err(err) = request.filters.validate() {
        return error_response(StatusCode::BAD_REQUEST, err.to_string());
    }

    let filters_json = match serde_json::to_string(&request.filters) {
        Ok(json) => json,
        Err(err) => {
            error!("Failed to serialize filters: {err}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Erreur interne");
        }
    };

    match storage::insert(&pool, &user.user_id, name, request.filters, &filters_json).await {
        Ok(search) => {
            info!(search_id = %search.id, "Saved search created");
            (StatusCode::CREATED, Json(search)).into_response()
        }
        Err(err) => {
            error!("Failed to insert saved search: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Erreur interne")
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/saved-searches/{id}",
    params(("id" = String, Path, description = "Saved search id")),
    responses(
        (status = 204, description = "Search deleted"),
        (status = 401, description = "No valid session", body = ErrorResponse),
        (status = 404, description = "No such search for this user", body = ErrorResponse),
    ),
    tag = "screening"
)]
pub async fn delete(
    headers: HeaderMap,
    pool: Extension<AnyPool>,
    auth_state: Extension<Arc<AuthState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let user = match authenticate_session(&headers, &pool, &auth_state).await {
        Ok(Some(user)) => user,
        Ok(None) => return error_response(StatusCode::UNAUTHORIZED, UNAUTHENTICATED),
        Err(status) => return error_response(status, "Erreur interne"),
    };

    match storage::delete_for_user(&pool, &user.user_id, &id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => error_response(StatusCode::NOT_FOUND, "Recherche introuvable"),
        Err(err) => {
            error!("Failed to delete saved search: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Erreur interne")
        }
    }
}
