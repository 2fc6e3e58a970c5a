//! Domain layer: subscription identity, records, and the registry.
//!
//! The [`SubscriberRegistry`] is the only state shared between WebSocket
//! sessions and the single source of truth for live subscriptions.

pub mod subscriber_record;
pub mod subscriber_registry;
pub mod subscription_id;

pub use subscriber_record::SubscriberRecord;
pub use subscriber_registry::SubscriberRegistry;
pub use subscription_id::SubscriptionId;
