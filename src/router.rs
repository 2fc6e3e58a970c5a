//! Router composition: REST endpoints plus the WebSocket route.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::AppState;
use crate::config::ServerConfig;
use crate::domain::SubscriberRegistry;
use crate::service::ProtocolDispatcher;
use crate::ws::handler::ws_handler;

/// Path of the WebSocket endpoint.
pub const WS_PATH: &str = "/websocket";

/// Builds application state around a fresh, empty registry.
#[must_use]
pub fn build_state(config: &ServerConfig) -> AppState {
    let registry = Arc::new(SubscriberRegistry::new());
    AppState {
        dispatcher: Arc::new(ProtocolDispatcher::new(registry)),
        session: config.session(),
    }
}

/// Builds the full application router.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(api::build_router())
        .route(WS_PATH, get(ws_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
