//! Protocol dispatcher: request envelope in, optional response envelope out.

use std::sync::Arc;

use crate::domain::SubscriberRegistry;
use crate::ws::messages::{
    AddSubscriberRequest, AddSubscriberResponse, Envelope, RemoveSubscriberRequest,
    RemoveSubscriberResponse,
};

/// Stateless coordinator between decoded requests and the
/// [`SubscriberRegistry`].
///
/// Shared by every connection; the registry it holds is the only state that
/// crosses sessions.
#[derive(Debug, Clone)]
pub struct ProtocolDispatcher {
    registry: Arc<SubscriberRegistry>,
}

impl ProtocolDispatcher {
    /// Creates a dispatcher over the given registry.
    #[must_use]
    pub fn new(registry: Arc<SubscriberRegistry>) -> Self {
        Self { registry }
    }

    /// Returns a reference to the inner [`SubscriberRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    /// Handles one decoded envelope and returns the response to send, if
    /// any.
    ///
    /// Requests always get a response. Response variants and unknown
    /// discriminators are logged and produce nothing.
    pub async fn dispatch(&self, envelope: Envelope) -> Option<Envelope> {
        match envelope {
            Envelope::AddSubscriberRequest(request) => {
                Some(Envelope::AddSubscriberResponse(self.add_subscriber(request).await))
            }
            Envelope::RemoveSubscriberRequest(request) => Some(
                Envelope::RemoveSubscriberResponse(self.remove_subscriber(request).await),
            ),
            Envelope::AddSubscriberResponse(_) | Envelope::RemoveSubscriberResponse(_) => {
                tracing::warn!(
                    message_type = ?envelope.message_type(),
                    "response message sent to server; ignoring"
                );
                None
            }
            Envelope::Unknown(raw) => {
                tracing::warn!(message_type = %raw, "unknown message type");
                None
            }
        }
    }

    async fn add_subscriber(&self, request: AddSubscriberRequest) -> AddSubscriberResponse {
        let AddSubscriberRequest {
            subscriber_id,
            name,
            topic,
        } = request;
        tracing::info!(subscriber_id, %name, %topic, "add subscriber");

        let subscription_id = self
            .registry
            .add_subscriber(subscriber_id, name, topic)
            .await;
        tracing::info!(subscriber_id, %subscription_id, "subscription created");

        AddSubscriberResponse {
            subscriber_id,
            subscription_id,
            success: true,
        }
    }

    async fn remove_subscriber(&self, request: RemoveSubscriberRequest) -> RemoveSubscriberResponse {
        let RemoveSubscriberRequest {
            subscriber_id,
            subscription_id,
        } = request;

        let success = if subscription_id.is_nil() {
            tracing::debug!(subscriber_id, "remove without a subscription id");
            false
        } else {
            self.registry
                .remove_subscriber(subscriber_id, subscription_id)
                .await
        };
        if success {
            tracing::info!(subscriber_id, %subscription_id, "subscription removed");
        } else {
            tracing::info!(subscriber_id, %subscription_id, "remove for unknown subscription");
        }

        RemoveSubscriberResponse {
            subscriber_id,
            subscription_id,
            success,
        }
    }
}
