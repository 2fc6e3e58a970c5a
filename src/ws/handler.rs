//! Axum WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::app_state::AppState;

/// `GET /websocket` — Upgrade HTTP connection to WebSocket.
///
/// Each upgraded connection runs its own session task; the accept loop
/// never waits on it.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    tracing::info!("websocket request received");
    let dispatcher = Arc::clone(&state.dispatcher);
    let config = state.session;

    ws.max_message_size(config.max_message_size)
        .on_upgrade(move |socket| async move {
            let _ = run_connection(socket, dispatcher, config).await;
        })
}
