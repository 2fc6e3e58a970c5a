//! JSON codec for protocol envelopes.
//!
//! Decoding runs in two passes: the first parses the payload as a JSON object
//! and reads `MessageType`, the second converts the remaining fields into the
//! body that discriminator names.
//! Unrecognised discriminators are not errors; they decode to
//! [`Envelope::Unknown`] so that newer peers do not break older servers.

use serde::Serialize;
use serde_json::Value;

use super::messages::{Envelope, MessageType};
use crate::error::GatewayError;

/// Serialization view that writes `MessageType` ahead of the body fields.
#[derive(Debug, Serialize)]
struct Tagged<'a, T: Serialize> {
    #[serde(rename = "MessageType")]
    message_type: MessageType,
    #[serde(flatten)]
    body: &'a T,
}

/// Decodes one text payload into an [`Envelope`].
///
/// # Errors
///
/// Returns [`GatewayError::Decode`] if the payload is not a JSON object, has
/// no (or a `null`) `MessageType`, or a recognised `MessageType` whose body
/// fields do not match the variant.
pub fn decode(payload: &str) -> Result<Envelope, GatewayError> {
    let Value::Object(mut fields) = serde_json::from_str::<Value>(payload)? else {
        return Err(GatewayError::Decode("payload is not a JSON object".to_string()));
    };
    let raw = match fields.get("MessageType") {
        Some(Value::Null) | None => {
            return Err(GatewayError::Decode("missing MessageType".to_string()));
        }
        Some(raw) => raw.clone(),
    };

    let Some(kind) = MessageType::from_value(&raw) else {
        return Ok(Envelope::Unknown(raw));
    };

    fields.remove("MessageType");
    let body = Value::Object(fields);
    let envelope = match kind {
        MessageType::AddSubscriberRequest => {
            Envelope::AddSubscriberRequest(serde_json::from_value(body)?)
        }
        MessageType::AddSubscriberResponse => {
            Envelope::AddSubscriberResponse(serde_json::from_value(body)?)
        }
        MessageType::RemoveSubscriberRequest => {
            Envelope::RemoveSubscriberRequest(serde_json::from_value(body)?)
        }
        MessageType::RemoveSubscriberResponse => {
            Envelope::RemoveSubscriberResponse(serde_json::from_value(body)?)
        }
    };
    Ok(envelope)
}

/// Encodes an [`Envelope`] as a single-line JSON payload.
///
/// The bodies contain only integers, strings, booleans and UUIDs, so
/// serialization cannot fail in practice.
#[must_use]
pub fn encode(envelope: &Envelope) -> String {
    let encoded = match envelope {
        Envelope::AddSubscriberRequest(body) => tagged(MessageType::AddSubscriberRequest, body),
        Envelope::AddSubscriberResponse(body) => tagged(MessageType::AddSubscriberResponse, body),
        Envelope::RemoveSubscriberRequest(body) => {
            tagged(MessageType::RemoveSubscriberRequest, body)
        }
        Envelope::RemoveSubscriberResponse(body) => {
            tagged(MessageType::RemoveSubscriberResponse, body)
        }
        Envelope::Unknown(raw) => serde_json::to_string(&serde_json::json!({ "MessageType": raw })),
    };
    encoded.unwrap_or_default()
}

fn tagged<T: Serialize>(message_type: MessageType, body: &T) -> serde_json::Result<String> {
    serde_json::to_string(&Tagged { message_type, body })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::SubscriptionId;
    use crate::ws::messages::{
        AddSubscriberRequest, AddSubscriberResponse, RemoveSubscriberRequest,
        RemoveSubscriberResponse,
    };

    fn sample_envelopes() -> Vec<Envelope> {
        let sid = SubscriptionId::generate();
        vec![
            Envelope::AddSubscriberRequest(AddSubscriberRequest {
                subscriber_id: 100,
                name: "John Doe".to_string(),
                topic: "Weather reports".to_string(),
            }),
            Envelope::AddSubscriberResponse(AddSubscriberResponse {
                subscriber_id: 100,
                subscription_id: sid,
                success: true,
            }),
            Envelope::RemoveSubscriberRequest(RemoveSubscriberRequest {
                subscriber_id: 100,
                subscription_id: sid,
            }),
            Envelope::RemoveSubscriberResponse(RemoveSubscriberResponse {
                subscriber_id: -3,
                subscription_id: SubscriptionId::nil(),
                success: false,
            }),
            Envelope::Unknown(serde_json::json!(99)),
        ]
    }

    #[test]
    fn decode_inverts_encode() {
        for envelope in sample_envelopes() {
            let payload = encode(&envelope);
            let Ok(decoded) = decode(&payload) else {
                panic!("failed to decode {payload}");
            };
            assert_eq!(decoded, envelope);
        }
    }

    #[test]
    fn encode_writes_discriminator_first_as_integer() {
        let payload = encode(&Envelope::AddSubscriberRequest(AddSubscriberRequest {
            subscriber_id: 100,
            name: "John Doe".to_string(),
            topic: "Weather reports".to_string(),
        }));
        assert_eq!(
            payload,
            r#"{"MessageType":0,"SubscriberId":100,"Name":"John Doe","Topic":"Weather reports"}"#
        );
    }

    #[test]
    fn decode_accepts_string_discriminator() {
        let payload = r#"{"MessageType":"AddSubscriberRequest","SubscriberId":1,"Name":"n","Topic":"t"}"#;
        let Ok(Envelope::AddSubscriberRequest(req)) = decode(payload) else {
            panic!("expected add request");
        };
        assert_eq!(req.subscriber_id, 1);
    }

    #[test]
    fn decode_ignores_extra_fields() {
        let payload = r#"{"MessageType":0,"SubscriberId":1,"Name":"n","Topic":"t","Color":"red"}"#;
        assert!(matches!(
            decode(payload),
            Ok(Envelope::AddSubscriberRequest(_))
        ));
    }

    #[test]
    fn unknown_discriminator_is_not_an_error() {
        let Ok(envelope) = decode(r#"{"MessageType":17,"Whatever":true}"#) else {
            panic!("unknown discriminator must decode");
        };
        assert_eq!(envelope, Envelope::Unknown(serde_json::json!(17)));

        let Ok(envelope) = decode(r#"{"MessageType":"Publish"}"#) else {
            panic!("unknown discriminator must decode");
        };
        assert_eq!(envelope.message_type(), None);
    }

    #[test]
    fn missing_discriminator_is_an_error() {
        assert!(matches!(
            decode(r#"{"SubscriberId":1}"#),
            Err(GatewayError::Decode(_))
        ));
        assert!(matches!(
            decode(r#"{"MessageType":null}"#),
            Err(GatewayError::Decode(_))
        ));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(decode("not json").is_err());
        assert!(decode(r#"{"MessageType":0"#).is_err());
        assert!(decode("[0, 1]").is_err());
    }

    #[test]
    fn non_object_payloads_are_errors() {
        for payload in ["[17]", r#"["Publish"]"#, "[0]", "17", r#""AddSubscriberRequest""#, "null"] {
            assert!(
                matches!(decode(payload), Err(GatewayError::Decode(_))),
                "{payload} must not decode"
            );
        }
    }

    #[test]
    fn body_shape_mismatch_is_an_error() {
        // Known discriminator, but SubscriptionId is not a UUID.
        let payload = r#"{"MessageType":2,"SubscriberId":1,"SubscriptionId":"nope"}"#;
        assert!(matches!(decode(payload), Err(GatewayError::Decode(_))));
    }
}
