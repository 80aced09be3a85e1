use super::handlers::{auth, health, saved_searches, screening};
use utoipa::OpenApi;

/// `OpenAPI` document for every documented route.
///
/// Add new endpoints to `paths(...)` so they show up in `/swagger-ui` and in
/// the output of the `openapi` binary. `/` is intentionally left out.
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        screening::search,
        screening::indices,
        screening::stock,
        saved_searches::list,
        saved_searches::create,
        saved_searches::delete,
        auth::session::status,
        auth::register::register,
        auth::login::login,
        auth::session::logout,
    ),
    tags(
        (name = "screening", description = "Stock search over Eurostoxx 600 and S&P 500"),
        (name = "auth", description = "Accounts and sessions"),
        (name = "health", description = "Service health"),
    )
)]
pub(crate) struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
