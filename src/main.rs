//! subscription-gateway server entry point.
//!
//! Starts the Axum HTTP server with the WebSocket and REST endpoints.

use tracing_subscriber::EnvFilter;

use subscription_gateway::config::{LogFormat, ServerConfig};
use subscription_gateway::router::{WS_PATH, build_app, build_state};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ServerConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting subscription-gateway");

    // Build application
    let app = build_app(build_state(&config));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(
        addr = %config.listen_addr,
        ws_path = WS_PATH,
        send_timeout_ms = config.send_timeout.as_millis(),
        "server listening"
    );

    axum::serve(listener, app).await?;

    Ok(())
}
