//! API route definitions

use axum::{middleware, routing::get, Router};
use utoipa::OpenApi;

use crate::{
    handlers::{health, shell},
    middleware::logging_middleware,
    state::AppState,
};

/// API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/apps/{app}/shell", get(shell::open_shell))
        .route("/api-docs/openapi.json", get(health::openapi_json))
}

/// Combined routes with state and request logging applied
pub fn all_routes(state: AppState) -> Router {
    api_routes()
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

/// OpenAPI document
#[derive(OpenApi)]
#[openapi(
    paths(health::health_check, shell::open_shell),
    components(schemas(crate::models::HealthResponse)),
    info(
        title = "UnitShell API",
        version = "0.1.0",
        description = "Interactive shells on application units over WebSocket"
    )
)]
pub struct ApiDoc;
