use crate::{
    api::handlers::{auth, health, root, saved_searches, screening},
    db::{self, DatabaseUrl},
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::{delete, get, post},
    Extension, Router,
};
use sqlx::AnyPool;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer, request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use utoipa_swagger_ui::SwaggerUi;

pub mod handlers;
mod openapi;

pub use openapi::openapi;

/// Screening routes mounted under `/api`.
pub fn screening_router() -> Router {
    Router::new()
        .route("/api/search", post(screening::search))
        .route("/api/indices", get(screening::indices))
        .route("/api/stocks/:symbol", get(screening::stock))
        .route(
            "/api/saved-searches",
            get(saved_searches::list).post(saved_searches::create),
        )
        .route("/api/saved-searches/:id", delete(saved_searches::delete))
}

/// Build the full application: both route groups, docs and shared layers.
pub fn app(pool: AnyPool, auth_state: Arc<auth::AuthState>) -> Router {
    Router::new()
        .route("/", get(root::root))
        .route("/health", get(health::health).options(health::health))
        .merge(screening_router())
        .merge(auth::router())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(CorsLayer::permissive())
                .layer(Extension(auth_state))
                .layer(Extension(pool)),
        )
}

/// Start the server
/// # Errors
/// Return error if the database is unreachable or the address can't be bound
pub async fn new(
    host: &str,
    port: u16,
    database_url: &DatabaseUrl,
    auth_config: auth::AuthConfig,
) -> Result<()> {
    info!(
        "Using {} database {}",
        database_url.backend().as_str(),
        database_url.redacted()
    );
    let pool = db::connect(database_url).await?;

    let auth_state = Arc::new(auth::AuthState::new(auth_config));
    let app = app(pool, auth_state);

    let address = bind_address(host, port)?;
    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;

    info!("Listening on {}", address);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn bind_address(host: &str, port: u16) -> Result<SocketAddr> {
    // Accept bare IPv6 literals like `::` as well as `[::]`.
    let host = host.trim().trim_start_matches('[').trim_end_matches(']');
    let ip = host
        .parse::<std::net::IpAddr>()
        .with_context(|| format!("Invalid host address: {host}"))?;
    Ok(SocketAddr::new(ip, port))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Gracefully shutdown");
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

#[cfg(test)]
pub(crate) async fn test_app() -> Result<(Router, AnyPool)> {
    use secrecy::SecretString;

    let pool = db::connect(&DatabaseUrl::parse("sqlite::memory:")?).await?;
    let auth_state = Arc::new(auth::AuthState::new(auth::AuthConfig::new(
        SecretString::from("test-secret"),
    )));
    Ok((app(pool.clone(), auth_state), pool))
}
