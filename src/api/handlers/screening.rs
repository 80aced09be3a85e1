//! Public screening endpoints: search, index listing and stock lookup.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::AnyPool;
use tracing::{debug, error, instrument};
use utoipa::ToSchema;

use super::{error_response, ErrorResponse};
use crate::stocks::{
    screen,
    storage::{count_by_index, find_stock, load_stocks},
    MarketIndex, SearchFilters, StockResult,
};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SearchResponse {
    pub results: Vec<StockResult>,
    pub count: usize,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct IndexSummary {
    pub id: MarketIndex,
    pub name: String,
    pub count: i64,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct IndicesResponse {
    pub indices: Vec<IndexSummary>,
}

#[utoipa::path(
    post,
    path = "/api/search",
    request_body = SearchFilters,
    responses(
        (status = 200, description = "Matching stocks, most relevant first", body = SearchResponse),
        (status = 400, description = "Invalid filters", body = ErrorResponse),
    ),
    tag = "screening"
)]
#[instrument(skip(pool, payload))]
pub async fn search(
    pool: Extension<AnyPool>,
    payload: Option<Json<SearchFilters>>,
) -> impl IntoResponse {
    let Some(Json(filters)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Requête invalide");
    };

    // Reject bad filters before touching the database.
    if let Err(err) = filters.validate() {
        return error_response(StatusCode::BAD_REQUEST, err.to_string());
    }

    let candidates = match load_stocks(&pool, filters.index.market_index()).await {
        Ok(stocks) => stocks,
        Err(err) => {
            error!("Failed to load stocks: {err}");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Erreur lors de la recherche",
            );
        }
    };

    match screen(candidates, &filters) {
        Ok(results) => {
            debug!("search matched {} stocks", results.len());
            let count = results.len();
            (StatusCode::OK, Json(SearchResponse { results, count })).into_response()
        }
        Err(err) => error_response(StatusCode::BAD_REQUEST, err.to_string()),
    }
}

#[utoipa::path(
    get,
    path = "/api/indices",
    responses(
        (status = 200, description = "Supported indexes with their stock counts", body = IndicesResponse),
    ),
    tag = "screening"
)]
pub async fn indices(pool: Extension<AnyPool>) -> impl IntoResponse {
    let counts = match count_by_index(&pool).await {
        Ok(counts) => counts,
        Err(err) => {
            error!("Failed to count stocks: {err}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Erreur interne");
        }
    };

    let indices = MarketIndex::ALL
        .into_iter()
        .map(|index| IndexSummary {
            id: index,
            name: index.display_name().to_string(),
            count: counts.get(&index).copied().unwrap_or(0),
        })
        .collect();

    (StatusCode::OK, Json(IndicesResponse { indices })).into_response()
}

#[utoipa::path(
    get,
    path = "/api/stocks/{symbol}",
    params(("symbol" = String, Path, description = "Ticker symbol, case insensitive")),
    responses(
        (status = 200, description = "Stock details", body = StockResult),
        (status = 404, description = "Unknown symbol", body = ErrorResponse),
    ),
    tag = "screening"
)]
pub async fn stock(pool: Extension<AnyPool>, Path(symbol): Path<String>) -> impl IntoResponse {
    match find_stock(&pool, &symbol).await {
        Ok(Some(stock)) => (StatusCode::OK, Json(StockResult::from(&stock))).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Action introuvable"),
        Err(err) => {
            error!("Failed to load stock {symbol}: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Erreur interne")
        }
    }
}
