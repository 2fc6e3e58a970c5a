//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::ProtocolDispatcher;
use crate::ws::connection::SessionConfig;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Dispatcher (and through it, the registry) shared by every session.
    pub dispatcher: Arc<ProtocolDispatcher>,
    /// Settings applied to each new WebSocket session.
    pub session: SessionConfig,
}
