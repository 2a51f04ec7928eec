//! Gatekeeper HTTP Adapter
//!
//! Axum host for the core: `/auth/*` endpoints, the refresh token cookie,
//! bearer token extraction and the OpenAPI document.

pub mod auth_api;
pub mod cookie;
pub mod error;
pub mod middleware;

pub use auth_api::{auth_router, AuthState};
pub use cookie::RefreshCookie;
pub use error::{ApiError, ErrorResponse};
pub use middleware::{extract_bearer_token, Authenticated};

use axum::{routing::get, Json, Router};
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa_axum::router::OpenApiRouter;

/// Where the generated OpenAPI document is served.
pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

/// Build the application router.
///
/// The `/auth` routes are only mounted when `endpoints_enabled` is true, so a
/// host can embed the core behind its own endpoints instead.
pub fn app_router(state: AuthState, endpoints_enabled: bool) -> Router {
    let mut api = OpenApiRouter::new();
    if endpoints_enabled {
        api = api.nest("/auth", auth_router(state));
    } else {
        info!("Built-in /auth endpoints disabled");
    }

    let (router, mut openapi) = api.split_for_parts();
    openapi.info.title = "Gatekeeper API".to_string();
    openapi.info.version = env!("CARGO_PKG_VERSION").to_string();
    openapi.info.description = Some("Login, refresh token rotation and logout".to_string());

    router
        .route(
            OPENAPI_PATH,
            get(move || {
                let doc = openapi.clone();
                async move { Json(doc) }
            }),
        )
        .layer(TraceLayer::new_for_http())
}
