//! Client side of the subscription protocol.
//!
//! [`SubscriberClient`] is the boundary a front end drives: it sends frames
//! and reports inbound messages, server closes and failures through
//! [`ClientEvents`].

pub mod correlation;
pub mod events;
pub mod ws_client;

pub use correlation::LastSubscription;
pub use events::{ClientEvent, ClientEvents, LoggingEvents};
pub use ws_client::{ClientError, SubscriberClient};
