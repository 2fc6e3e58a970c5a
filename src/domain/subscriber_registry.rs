//! Concurrent subscription storage.
//!
//! [`SubscriberRegistry`] keeps every live subscription in a single
//! `HashMap` behind one [`tokio::sync::Mutex`]. Every operation takes the
//! same lock, so adds and removes coming from different sessions are fully
//! serialized.

use std::collections::HashMap;

use tokio::sync::Mutex;

use super::{SubscriberRecord, SubscriptionId};

/// Central store for all live subscriptions.
///
/// # Concurrency
///
/// - All operations, reads included, are mutually exclusive.
/// - No operation holds the lock across an `.await` other than the lock
///   acquisition itself.
#[derive(Debug)]
pub struct SubscriberRegistry {
    subscriptions: Mutex<HashMap<SubscriptionId, SubscriberRecord>>,
}

impl SubscriberRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscriptions: Mutex::new(HashMap::new()),
        }
    }

    /// Registers `name` as interested in `topic` and returns the new
    /// subscription id.
    ///
    /// Always succeeds. Duplicate subscriber ids and topics are accepted;
    /// each call yields a distinct subscription. Ids are random v4 UUIDs and
    /// are not checked for collisions.
    pub async fn add_subscriber(
        &self,
        subscriber_id: i32,
        name: impl Into<String>,
        topic: impl Into<String>,
    ) -> SubscriptionId {
        let subscription_id = SubscriptionId::generate();
        let record = SubscriberRecord::new(subscription_id, subscriber_id, name.into(), topic.into());
        self.subscriptions.lock().await.insert(subscription_id, record);
        subscription_id
    }

    /// Removes the subscription with the given id.
    ///
    /// The lookup is by `subscription_id` only; `subscriber_id` is carried
    /// for logging. Returns `false` when no such subscription exists, which
    /// is an ordinary outcome rather than an error.
    pub async fn remove_subscriber(
        &self,
        subscriber_id: i32,
        subscription_id: SubscriptionId,
    ) -> bool {
        let removed = self.subscriptions.lock().await.remove(&subscription_id);
        match removed {
            Some(record) => {
                if record.subscriber_id != subscriber_id {
                    tracing::debug!(
                        %subscription_id,
                        owner = record.subscriber_id,
                        requested_by = subscriber_id,
                        "subscription removed by a different subscriber id"
                    );
                }
                true
            }
            None => false,
        }
    }

    /// Returns a copy of the record for `subscription_id`, if live.
    pub async fn get(&self, subscription_id: SubscriptionId) -> Option<SubscriberRecord> {
        self.subscriptions.lock().await.get(&subscription_id).cloned()
    }

    /// Returns all live records, optionally filtered by topic, oldest first.
    pub async fn list(&self, topic_filter: Option<&str>) -> Vec<SubscriberRecord> {
        let mut records: Vec<SubscriberRecord> = {
            let map = self.subscriptions.lock().await;
            map.values()
                .filter(|record| topic_filter.is_none_or(|topic| record.topic == topic))
                .cloned()
                .collect()
        };
        records.sort_by_key(|record| record.created_at);
        records
    }

    /// Returns the number of live subscriptions.
    pub async fn len(&self) -> usize {
        self.subscriptions.lock().await.len()
    }

    /// Returns `true` if there are no live subscriptions.
    pub async fn is_empty(&self) -> bool {
        self.subscriptions.lock().await.is_empty()
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}
