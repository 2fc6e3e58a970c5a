//! Server configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).
//!
//! | Variable              | Default        |
//! |-----------------------|----------------|
//! | `LISTEN_ADDR`         | `0.0.0.0:8080` |
//! | `WS_SEND_TIMEOUT_MS`  | `5000`         |
//! | `WS_KEEPALIVE_SECS`   | `10`           |
//! | `WS_MAX_MESSAGE_SIZE` | `65536`        |
//! | `LOG_FORMAT`          | `text`         |

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;

use crate::ws::connection::SessionConfig;

/// Log output format for `tracing-subscriber`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

/// Top-level server configuration.
///
/// Loaded once at startup via [`ServerConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8080`).
    pub listen_addr: SocketAddr,

    /// Upper bound on writing one response to a WebSocket.
    pub send_timeout: Duration,

    /// Idle keep-alive ping interval. `None` disables pings.
    pub keepalive: Option<Duration>,

    /// Largest inbound logical message accepted, in bytes.
    pub max_message_size: usize,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            send_timeout: Duration::from_millis(5000),
            keepalive: Some(Duration::from_secs(10)),
            max_message_size: 64 * 1024,
            log_format: LogFormat::Text,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is unset or its numeric value
    /// does not parse. Calls `dotenvy::dotenv().ok()` to optionally load a
    /// `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as a
    /// [`SocketAddr`].
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr = match std::env::var("LISTEN_ADDR") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("invalid LISTEN_ADDR: {raw}"))?,
            Err(_) => defaults.listen_addr,
        };

        let send_timeout = Duration::from_millis(parse_env("WS_SEND_TIMEOUT_MS", 5000));
        let keepalive = match parse_env("WS_KEEPALIVE_SECS", 10u64) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        let max_message_size = parse_env("WS_MAX_MESSAGE_SIZE", defaults.max_message_size);
        let log_format = parse_log_format(std::env::var("LOG_FORMAT").ok().as_deref());

        Ok(Self {
            listen_addr,
            send_timeout,
            keepalive,
            max_message_size,
            log_format,
        })
    }

    /// Per-connection settings handed to every WebSocket session.
    #[must_use]
    pub const fn session(&self) -> SessionConfig {
        SessionConfig {
            send_timeout: self.send_timeout,
            keepalive: self.keepalive,
            max_message_size: self.max_message_size,
        }
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// `"json"` (any case) selects JSON logs; anything else is text.
fn parse_log_format(raw: Option<&str>) -> LogFormat {
    match raw {
        Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
        _ => LogFormat::Text,
    }
}
