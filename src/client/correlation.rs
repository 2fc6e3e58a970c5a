//! One-slot subscription cache.
//!
//! The client remembers only the subscription id from the most recent
//! `AddSubscriberResponse` and uses it for the next remove. Responses are
//! not matched to requests: with several adds in flight on one connection,
//! whichever response arrives last wins the slot.

use std::sync::{Mutex, PoisonError};

use crate::domain::SubscriptionId;
use crate::ws::messages::Envelope;

/// Holds the subscription id of the latest add response, if any.
#[derive(Debug, Default)]
pub struct LastSubscription {
    slot: Mutex<Option<SubscriptionId>>,
}

impl LastSubscription {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached id.
    #[must_use]
    pub fn get(&self) -> Option<SubscriptionId> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the cached id.
    pub fn set(&self, subscription_id: SubscriptionId) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(subscription_id);
    }

    /// Caches the id carried by an `AddSubscriberResponse`. Other envelopes
    /// leave the slot untouched. Returns `true` if the slot changed.
    pub fn observe(&self, envelope: &Envelope) -> bool {
        match envelope {
            Envelope::AddSubscriberResponse(resp) => {
                self.set(resp.subscription_id);
                true
            }
            _ => false,
        }
    }
}
