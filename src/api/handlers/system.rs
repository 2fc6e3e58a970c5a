//! System endpoints: health check and the plain REST greeting.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{any, get};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::app_state::AppState;

/// Body returned by every `/restapi` request.
pub const HELLO_BODY: &str = "Hello world!";

/// Health check response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    subscriptions: usize,
}

/// `GET /health` — Service health status.
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let subscriptions = state.dispatcher.registry().len().await;
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            subscriptions,
        }),
    )
}

/// `ANY /restapi/...` — Plain HTTP endpoint sharing the listener with the
/// WebSocket route. Always answers `200 Hello world!`; it carries no
/// protocol traffic.
pub async fn hello_handler() -> impl IntoResponse {
    tracing::debug!("http request received");
    (StatusCode::OK, HELLO_BODY)
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/restapi", any(hello_handler))
        .route("/restapi/", any(hello_handler))
        .route("/restapi/{*rest}", any(hello_handler))
}
