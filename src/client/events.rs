//! Inbound notifications delivered to the application embedding the client.

use tokio::sync::mpsc;

/// Callbacks invoked by the client's read task.
///
/// Implementations run on the read task, so they should return quickly.
pub trait ClientEvents: Send + Sync + 'static {
    /// A complete text message arrived from the server.
    fn on_message_received(&self, text: &str);

    /// The server closed the connection and the close handshake was answered.
    /// Not called when the close was started locally.
    fn on_closed(&self);

    /// The connection failed.
    fn on_error(&self, reason: &str);
}

/// Owned form of a [`ClientEvents`] callback, for channel-based consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// See [`ClientEvents::on_message_received`].
    MessageReceived(String),
    /// See [`ClientEvents::on_closed`].
    Closed,
    /// See [`ClientEvents::on_error`].
    Error(String),
}

impl ClientEvents for mpsc::UnboundedSender<ClientEvent> {
    fn on_message_received(&self, text: &str) {
        let _ = self.send(ClientEvent::MessageReceived(text.to_owned()));
    }

    fn on_closed(&self) {
        let _ = self.send(ClientEvent::Closed);
    }

    fn on_error(&self, reason: &str) {
        let _ = self.send(ClientEvent::Error(reason.to_owned()));
    }
}

/// Writes every notification to the `tracing` log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingEvents;

impl ClientEvents for LoggingEvents {
    fn on_message_received(&self, text: &str) {
        tracing::info!(%text, "message received");
    }

    fn on_closed(&self) {
        tracing::info!("connection closed by server");
    }

    fn on_error(&self, reason: &str) {
        tracing::warn!(%reason, "connection error");
    }
}
