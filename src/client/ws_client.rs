//! WebSocket client for the subscription protocol.
//!
//! Sends add/remove requests and reports everything the server sends back
//! through [`ClientEvents`]. A background task owns the read half of the
//! socket; the write half is shared behind a lock so that the read task can
//! answer a server-initiated close.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::correlation::LastSubscription;
use super::events::ClientEvents;
use crate::domain::SubscriptionId;
use crate::ws::codec;
use crate::ws::messages::{AddSubscriberRequest, Envelope, RemoveSubscriberRequest};

/// Default bound on a single send.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = Arc<Mutex<SplitSink<WsStream, Message>>>;

/// Errors from the WebSocket client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Handshake or socket failure.
    #[error("WebSocket error: {0}")]
    Ws(#[from] tungstenite::Error),

    /// A send did not complete in time.
    #[error("send timed out after {0:?}")]
    Timeout(Duration),

    /// The connection is closed or closing.
    #[error("connection closed")]
    Closed,
}

/// State shared between the client handle and its read task.
struct Shared {
    writer: WsWriter,
    last_subscription: LastSubscription,
    disconnecting: AtomicBool,
    events: Arc<dyn ClientEvents>,
}

/// Client connected to one subscription server.
pub struct SubscriberClient {
    shared: Arc<Shared>,
    send_timeout: Duration,
    read_handle: JoinHandle<()>,
}

impl fmt::Debug for SubscriberClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberClient")
            .field("send_timeout", &self.send_timeout)
            .field("last_subscription", &self.shared.last_subscription.get())
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}

impl SubscriberClient {
    /// Connects to `url` (e.g. `ws://127.0.0.1:8080/websocket`) and starts
    /// the read task.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Ws`] if the WebSocket handshake fails.
    pub async fn connect(url: &str, events: Arc<dyn ClientEvents>) -> Result<Self, ClientError> {
        let (ws_stream, _) = tokio_tungstenite::connect_async(url).await?;
        let (write, read) = ws_stream.split();

        let shared = Arc::new(Shared {
            writer: Arc::new(Mutex::new(write)),
            last_subscription: LastSubscription::new(),
            disconnecting: AtomicBool::new(false),
            events,
        });
        let read_handle = tokio::spawn(read_loop(read, Arc::clone(&shared)));

        tracing::info!(%url, "connected");
        Ok(Self {
            shared,
            send_timeout: DEFAULT_SEND_TIMEOUT,
            read_handle,
        })
    }

    /// Overrides the send timeout.
    #[must_use]
    pub fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    /// Returns `true` while the connection is usable.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.shared.disconnecting.load(Ordering::Acquire) && !self.read_handle.is_finished()
    }

    /// Subscription id from the most recent `AddSubscriberResponse`.
    #[must_use]
    pub fn last_subscription_id(&self) -> Option<SubscriptionId> {
        self.shared.last_subscription.get()
    }

    /// Sends one raw text frame.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Closed`] if the connection is not open.
    /// - [`ClientError::Timeout`] if the send exceeds the send timeout.
    /// - [`ClientError::Ws`] on socket failure.
    pub async fn send_frame(&self, text: &str) -> Result<(), ClientError> {
        if !self.is_open() {
            return Err(ClientError::Closed);
        }
        let mut writer = self.shared.writer.lock().await;
        match tokio::time::timeout(self.send_timeout, writer.send(Message::text(text.to_owned()))).await {
            Ok(result) => result.map_err(ClientError::from),
            Err(_) => Err(ClientError::Timeout(self.send_timeout)),
        }
    }

    /// Sends an `AddSubscriberRequest`. The response arrives through
    /// [`ClientEvents::on_message_received`] and updates
    /// [`Self::last_subscription_id`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::send_frame`].
    pub async fn add_subscriber(
        &self,
        subscriber_id: i32,
        name: &str,
        topic: &str,
    ) -> Result<(), ClientError> {
        let request = Envelope::AddSubscriberRequest(AddSubscriberRequest {
            subscriber_id,
            name: name.to_owned(),
            topic: topic.to_owned(),
        });
        self.send_frame(&codec::encode(&request)).await
    }

    /// Sends a `RemoveSubscriberRequest` for the cached subscription id.
    ///
    /// With nothing cached yet the nil id is sent, which the server answers
    /// with `Success = false`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::send_frame`].
    pub async fn remove_subscriber(&self, subscriber_id: i32) -> Result<(), ClientError> {
        let subscription_id = self
            .shared
            .last_subscription
            .get()
            .unwrap_or_else(SubscriptionId::nil);
        let request = Envelope::RemoveSubscriberRequest(RemoveSubscriberRequest {
            subscriber_id,
            subscription_id,
        });
        self.send_frame(&codec::encode(&request)).await
    }

    /// Starts the close handshake and waits for the read task to finish.
    ///
    /// [`ClientEvents::on_closed`] is not called for a locally started
    /// close.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Timeout`] if the close frame cannot be sent in
    /// time, or [`ClientError::Ws`] if sending it fails.
    pub async fn close(self) -> Result<(), ClientError> {
        self.shared.disconnecting.store(true, Ordering::Release);
        let sent = {
            let mut writer = self.shared.writer.lock().await;
            tokio::time::timeout(self.send_timeout, writer.close()).await
        };

        let mut read_handle = self.read_handle;
        if tokio::time::timeout(self.send_timeout, &mut read_handle)
            .await
            .is_err()
        {
            read_handle.abort();
        }

        match sent {
            Ok(
                Ok(())
                | Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed),
            ) => Ok(()),
            Ok(Err(err)) => Err(err.into()),
            Err(_) => Err(ClientError::Timeout(self.send_timeout)),
        }
    }
}

/// Reads until the connection ends, updating the cache and firing events.
async fn read_loop(mut read: SplitStream<WsStream>, shared: Arc<Shared>) {
    while let Some(item) = read.next().await {
        match item {
            Ok(Message::Text(text)) => {
                let text = text.as_str();
                match codec::decode(text) {
                    Ok(envelope) => {
                        tracing::debug!(message_type = ?envelope.message_type(), "message received");
                        shared.last_subscription.observe(&envelope);
                    }
                    Err(err) => tracing::warn!(error = %err, "undecodable message from server"),
                }
                shared.events.on_message_received(text);
            }
            Ok(Message::Close(_)) => {
                if !shared.disconnecting.swap(true, Ordering::AcqRel) {
                    let mut writer = shared.writer.lock().await;
                    let _ = tokio::time::timeout(DEFAULT_SEND_TIMEOUT, writer.close()).await;
                    drop(writer);
                    shared.events.on_closed();
                }
                return;
            }
            Ok(Message::Binary(data)) => {
                tracing::warn!(len = data.len(), "ignoring binary frame from server");
            }
            Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
            Err(err) => {
                if !shared.disconnecting.load(Ordering::Acquire) {
                    shared.events.on_error(&err.to_string());
                }
                return;
            }
        }
    }

    if !shared.disconnecting.load(Ordering::Acquire) {
        shared.events.on_error("connection ended without close frame");
    }
}
