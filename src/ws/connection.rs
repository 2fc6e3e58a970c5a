//! WebSocket connection state machine.
//!
//! One [`Session`] owns one connection and runs the request loop:
//! read a message, decode it, dispatch it, encode the response and write it
//! back within the send timeout. Only one request is in flight at a time; the
//! next message is not read until the previous response has been written.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::time::{Instant, Interval, MissedTickBehavior};

use super::codec;
use super::frame_reader::{FrameReader, Inbound};
use crate::error::GatewayError;
use crate::service::ProtocolDispatcher;

/// Close code sent when the peer breaks the text-only rule (RFC 6455 1003).
const CLOSE_UNSUPPORTED_DATA: u16 = 1003;

/// Per-connection settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Upper bound on writing one response.
    pub send_timeout: Duration,
    /// Idle keep-alive ping interval. `None` disables pings.
    pub keepalive: Option<Duration>,
    /// Largest inbound logical message accepted, in bytes.
    pub max_message_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            send_timeout: Duration::from_secs(5),
            keepalive: Some(Duration::from_secs(10)),
            max_message_size: 64 * 1024,
        }
    }
}

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Serving requests.
    Open,
    /// Peer asked to close; finishing the close handshake.
    Closing,
    /// Done. Terminal.
    Closed,
}

/// Why a session ended.
#[derive(Debug)]
pub enum SessionEnd {
    /// The peer closed the connection normally.
    Closed,
    /// The session was aborted by a fatal error.
    Aborted(GatewayError),
}

/// What woke the request loop.
enum Wakeup {
    Inbound(Result<Inbound, GatewayError>),
    Keepalive,
}

/// Request loop for a single connection.
pub struct Session<W, R> {
    connection_id: uuid::Uuid,
    writer: W,
    reader: FrameReader<R>,
    dispatcher: Arc<ProtocolDispatcher>,
    config: SessionConfig,
    state: SessionState,
}

impl<W, R> fmt::Debug for Session<W, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("connection_id", &self.connection_id)
            .field("state", &self.state)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<W, R> Session<W, R>
where
    W: Sink<Message> + Unpin,
    W::Error: fmt::Display,
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    /// Creates an open session over the two halves of a connection.
    pub fn new(
        writer: W,
        reader: R,
        dispatcher: Arc<ProtocolDispatcher>,
        config: SessionConfig,
    ) -> Self {
        Self {
            connection_id: uuid::Uuid::new_v4(),
            writer,
            reader: FrameReader::new(reader),
            dispatcher,
            config,
            state: SessionState::Open,
        }
    }

    /// Identifier used in this session's log lines.
    #[must_use]
    pub fn connection_id(&self) -> uuid::Uuid {
        self.connection_id
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Runs the request loop until the connection closes or fails.
    pub async fn run(mut self) -> SessionEnd {
        let connection_id = self.connection_id;
        tracing::info!(%connection_id, "ws session opened");

        let end = self.serve().await;
        self.state = SessionState::Closed;

        match &end {
            SessionEnd::Closed => {
                tracing::info!(
                    %connection_id,
                    messages = self.reader.messages_read(),
                    "ws session closed"
                );
            }
            SessionEnd::Aborted(err) => {
                tracing::warn!(
                    %connection_id,
                    messages = self.reader.messages_read(),
                    error = %err,
                    "ws session aborted"
                );
            }
        }
        end
    }

    async fn serve(&mut self) -> SessionEnd {
        let mut keepalive = self.config.keepalive.map(|period| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        while self.state == SessionState::Open {
            let wakeup = tokio::select! {
                inbound = self.reader.read_message() => Wakeup::Inbound(inbound),
                () = next_tick(&mut keepalive) => Wakeup::Keepalive,
            };

            match wakeup {
                Wakeup::Keepalive => {
                    if let Err(err) = self.send(Message::Ping(Bytes::new())).await {
                        return SessionEnd::Aborted(err);
                    }
                }
                Wakeup::Inbound(Ok(Inbound::Text(payload))) => {
                    if let Err(err) = self.handle_text(&payload).await {
                        return SessionEnd::Aborted(err);
                    }
                }
                Wakeup::Inbound(Ok(Inbound::Closed)) => {
                    self.state = SessionState::Closing;
                    // Completes the close handshake if the peer started it.
                    let _ = tokio::time::timeout(self.config.send_timeout, self.writer.close()).await;
                    return SessionEnd::Closed;
                }
                Wakeup::Inbound(Err(err)) => {
                    if matches!(err, GatewayError::ProtocolViolation(_)) {
                        let frame = CloseFrame {
                            code: CLOSE_UNSUPPORTED_DATA,
                            reason: Utf8Bytes::from_static("text frames only"),
                        };
                        let _ = self.send(Message::Close(Some(frame))).await;
                    }
                    return SessionEnd::Aborted(err);
                }
            }
        }
        SessionEnd::Closed
    }

    /// Decodes and dispatches one payload, writing the response if any.
    ///
    /// Decode failures are logged and swallowed; only write failures are
    /// returned.
    async fn handle_text(&mut self, payload: &str) -> Result<(), GatewayError> {
        let connection_id = self.connection_id;
        let envelope = match codec::decode(payload) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(%connection_id, error = %err, "dropping undecodable message");
                return Ok(());
            }
        };
        tracing::debug!(%connection_id, message_type = ?envelope.message_type(), "message received");

        let Some(response) = self.dispatcher.dispatch(envelope).await else {
            return Ok(());
        };
        self.send(Message::text(codec::encode(&response))).await
    }

    /// Writes one frame, bounded by the send timeout.
    async fn send(&mut self, message: Message) -> Result<(), GatewayError> {
        match tokio::time::timeout(self.config.send_timeout, self.writer.send(message)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(GatewayError::Transport(err.to_string())),
            Err(_) => Err(GatewayError::WriteTimeout {
                timeout_ms: u64::try_from(self.config.send_timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

/// Resolves on the next keep-alive tick, or never if keep-alive is off.
async fn next_tick(keepalive: &mut Option<Interval>) {
    match keepalive {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Runs a [`Session`] over an upgraded axum WebSocket.
pub async fn run_connection(
    socket: WebSocket,
    dispatcher: Arc<ProtocolDispatcher>,
    config: SessionConfig,
) -> SessionEnd {
    let (ws_tx, ws_rx) = socket.split();
    Session::new(ws_tx, ws_rx, dispatcher, config).run().await
}
