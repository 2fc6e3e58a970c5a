//! Protocol message types: the `MessageType` discriminator and the four
//! request/response bodies.
//!
//! Every message on the wire is a flat JSON object whose `MessageType` field
//! selects the variant; the remaining fields belong to that variant:
//!
//! ```json
//! {"MessageType":0,"SubscriberId":100,"Name":"John Doe","Topic":"Weather reports"}
//! ```

use serde::{Deserialize, Serialize, Serializer};

use crate::domain::SubscriptionId;

/// Discriminator for protocol messages.
///
/// Encoded as its integer code. The set is closed for this version of the
/// protocol, but peers may send codes it does not know; those decode to
/// [`Envelope::Unknown`] instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Client → Server: register a subscriber on a topic.
    AddSubscriberRequest,
    /// Server → Client: outcome of an add, carrying the new subscription id.
    AddSubscriberResponse,
    /// Client → Server: drop a subscription by id.
    RemoveSubscriberRequest,
    /// Server → Client: outcome of a remove.
    RemoveSubscriberResponse,
}

impl MessageType {
    /// All known discriminators, in code order.
    pub const ALL: [Self; 4] = [
        Self::AddSubscriberRequest,
        Self::AddSubscriberResponse,
        Self::RemoveSubscriberRequest,
        Self::RemoveSubscriberResponse,
    ];

    /// Returns the integer code written to the wire.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::AddSubscriberRequest => 0,
            Self::AddSubscriberResponse => 1,
            Self::RemoveSubscriberRequest => 2,
            Self::RemoveSubscriberResponse => 3,
        }
    }

    /// Returns the variant name, as accepted in string form on decode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddSubscriberRequest => "AddSubscriberRequest",
            Self::AddSubscriberResponse => "AddSubscriberResponse",
            Self::RemoveSubscriberRequest => "RemoveSubscriberRequest",
            Self::RemoveSubscriberResponse => "RemoveSubscriberResponse",
        }
    }

    /// Looks up a discriminator by integer code.
    #[must_use]
    pub fn from_code(code: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| u64::from(kind.code()) == code)
    }

    /// Looks up a discriminator by name, ignoring ASCII case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
    }

    /// Interprets a raw `MessageType` JSON value (integer or string).
    #[must_use]
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_u64().and_then(Self::from_code),
            serde_json::Value::String(s) => Self::from_name(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MessageType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

/// Body of [`MessageType::AddSubscriberRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddSubscriberRequest {
    /// Client-chosen subscriber number.
    pub subscriber_id: i32,
    /// Subscriber display name.
    pub name: String,
    /// Topic to register interest in.
    pub topic: String,
}

/// Body of [`MessageType::AddSubscriberResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddSubscriberResponse {
    /// Echo of the request's subscriber number.
    pub subscriber_id: i32,
    /// Newly issued subscription id.
    pub subscription_id: SubscriptionId,
    /// Always `true` from this server.
    pub success: bool,
}

/// Body of [`MessageType::RemoveSubscriberRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RemoveSubscriberRequest {
    /// Client-chosen subscriber number.
    pub subscriber_id: i32,
    /// Subscription to drop.
    pub subscription_id: SubscriptionId,
}

/// Body of [`MessageType::RemoveSubscriberResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RemoveSubscriberResponse {
    /// Echo of the request's subscriber number.
    pub subscriber_id: i32,
    /// Echo of the request's subscription id.
    pub subscription_id: SubscriptionId,
    /// `true` if the subscription was live and has been removed.
    pub success: bool,
}

/// A decoded protocol message (the envelope and its variant body).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// See [`AddSubscriberRequest`].
    AddSubscriberRequest(AddSubscriberRequest),
    /// See [`AddSubscriberResponse`].
    AddSubscriberResponse(AddSubscriberResponse),
    /// See [`RemoveSubscriberRequest`].
    RemoveSubscriberRequest(RemoveSubscriberRequest),
    /// See [`RemoveSubscriberResponse`].
    RemoveSubscriberResponse(RemoveSubscriberResponse),
    /// Envelope whose `MessageType` this version does not recognise. Holds
    /// the raw discriminator value.
    Unknown(serde_json::Value),
}

impl Envelope {
    /// Returns the discriminator, or `None` for [`Envelope::Unknown`].
    #[must_use]
    pub const fn message_type(&self) -> Option<MessageType> {
        match self {
            Self::AddSubscriberRequest(_) => Some(MessageType::AddSubscriberRequest),
            Self::AddSubscriberResponse(_) => Some(MessageType::AddSubscriberResponse),
            Self::RemoveSubscriberRequest(_) => Some(MessageType::RemoveSubscriberRequest),
            Self::RemoveSubscriberResponse(_) => Some(MessageType::RemoveSubscriberResponse),
            Self::Unknown(_) => None,
        }
    }
}
