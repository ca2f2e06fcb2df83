//! Health check and API document endpoints

use axum::{extract::State, http::header::CONTENT_TYPE, response::IntoResponse, Json};
use utoipa::OpenApi;

use crate::{error::ApiResult, models::HealthResponse, routes::ApiDoc, state::AppState};

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.uptime_seconds(),
    })
}

/// OpenAPI document for this server
pub async fn openapi_json() -> ApiResult<impl IntoResponse> {
    let document = ApiDoc::openapi().to_pretty_json()?;
    Ok(([(CONTENT_TYPE, "application/json")], document))
}
