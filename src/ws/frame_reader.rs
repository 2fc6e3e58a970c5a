//! Reads one logical text message at a time from a WebSocket.
//!
//! Continuation frames are stitched together by the WebSocket protocol layer
//! (tungstenite, underneath axum) before they reach this reader, so a message
//! sent as several fragments arrives here as a single `Text` item. The reader
//! classifies what comes next: a text payload, the end of the connection, or
//! a failure that must end the session.

use axum::extract::ws::Message;
use futures_util::{Stream, StreamExt};

use crate::error::GatewayError;

/// Result of a successful read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// One complete text message.
    Text(String),
    /// The peer sent a close frame or the stream ended.
    Closed,
}

/// Pulls logical messages off the read half of a WebSocket.
#[derive(Debug)]
pub struct FrameReader<S> {
    stream: S,
    messages_read: u64,
}

impl<S> FrameReader<S>
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    /// Wraps the read half of a connection.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            messages_read: 0,
        }
    }

    /// Number of text messages returned so far.
    #[must_use]
    pub fn messages_read(&self) -> u64 {
        self.messages_read
    }

    /// Waits for the next logical text message.
    ///
    /// Ping and pong frames are skipped; the transport answers pings on its
    /// own. Cancel-safe: dropping the future never loses a text message.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::Transport`] if the socket fails (including an
    ///   oversized message or an abrupt disconnect).
    /// - [`GatewayError::ProtocolViolation`] if the peer sends a binary
    ///   frame. Only text frames are part of the protocol.
    pub async fn read_message(&mut self) -> Result<Inbound, GatewayError> {
        loop {
            let Some(item) = self.stream.next().await else {
                return Ok(Inbound::Closed);
            };

            match item? {
                Message::Text(text) => {
                    self.messages_read = self.messages_read.saturating_add(1);
                    return Ok(Inbound::Text(text.as_str().to_owned()));
                }
                Message::Binary(data) => {
                    return Err(GatewayError::ProtocolViolation(format!(
                        "binary frame of {} bytes",
                        data.len()
                    )));
                }
                Message::Close(frame) => {
                    match frame {
                        Some(frame) => {
                            tracing::debug!(code = frame.code, reason = frame.reason.as_str(), "close frame received");
                        }
                        None => tracing::debug!("close frame received"),
                    }
                    return Ok(Inbound::Closed);
                }
                Message::Ping(_) | Message::Pong(_) => {}
            }
        }
    }
}
