//! Type-safe subscription identifier.
//!
//! [`SubscriptionId`] is a newtype wrapper around [`uuid::Uuid`] (v4) so that
//! server-issued subscription identifiers cannot be confused with other UUIDs
//! or with the client-supplied subscriber id.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-issued identifier of one subscription.
///
/// Generated once by [`super::SubscriberRegistry::add_subscriber`] and used
/// as the primary key of the registry. On the wire it is the plain UUID
/// string (`"SubscriptionId": "6f1c…"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(uuid::Uuid);

impl SubscriptionId {
    /// Issues a fresh random id (UUID v4).
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// The all-zero id. Never issued by the registry; a client with no
    /// cached subscription sends it in place of a real one.
    #[must_use]
    pub const fn nil() -> Self {
        Self(uuid::Uuid::nil())
    }

    /// Wraps a UUID taken from a request path.
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Returns `true` for [`Self::nil`].
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
