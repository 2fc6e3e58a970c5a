//! Server-owned record of one registered subscription.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::SubscriptionId;

/// One live subscription in the [`super::SubscriberRegistry`].
///
/// `subscriber_id` is supplied by the client and is not unique: the same
/// subscriber may hold any number of subscriptions, even on the same topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriberRecord {
    /// Primary key, generated by the registry.
    pub subscription_id: SubscriptionId,

    /// Client-supplied subscriber number.
    pub subscriber_id: i32,

    /// Display name of the subscriber.
    pub name: String,

    /// Topic the subscriber registered interest in.
    pub topic: String,

    /// When the registry accepted the subscription.
    pub created_at: DateTime<Utc>,
}

impl SubscriberRecord {
    /// Creates a record for a freshly issued subscription id.
    #[must_use]
    pub fn new(
        subscription_id: SubscriptionId,
        subscriber_id: i32,
        name: String,
        topic: String,
    ) -> Self {
        Self {
            subscription_id,
            subscriber_id,
            name,
            topic,
            created_at: Utc::now(),
        }
    }
}
