/// Push envelope for Pub/Sub deliveries
///
/// Wraps a base64-encoded payload with the provider-assigned message id and
/// publish time. One envelope arrives per delivery attempt; the same message id
/// may arrive again on redelivery.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::EnvelopeError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushEnvelope {
    /// The delivered message (absent only in malformed requests)
    pub message: Option<PushMessage>,

    /// Full subscription name, e.g. `projects/p/subscriptions/s`
    #[serde(default)]
    pub subscription: Option<String>,
}

/// One delivered message.
///
/// Pub/Sub push requests carry the id and publish time twice, once in
/// camelCase and once in snake_case, so each spelling has its own field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushMessage {
    /// Base64-encoded payload
    #[serde(default)]
    pub data: Option<String>,

    /// Provider-assigned id, stable across redeliveries
    #[serde(default, rename = "messageId", skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    #[serde(default, rename = "message_id", skip_serializing_if = "Option::is_none")]
    pub message_id_snake: Option<String>,

    /// RFC 3339 timestamp; kept raw so a bad value never rejects the delivery
    #[serde(default, rename = "publishTime", skip_serializing_if = "Option::is_none")]
    pub publish_time: Option<String>,

    #[serde(default, rename = "publish_time", skip_serializing_if = "Option::is_none")]
    pub publish_time_snake: Option<String>,

    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl PushMessage {
    /// First non-empty message id across both spellings.
    pub fn id(&self) -> Option<&str> {
        [&self.message_id, &self.message_id_snake]
            .into_iter()
            .flatten()
            .map(|id| id.trim())
            .find(|id| !id.is_empty())
    }

    /// Publish time across both spellings, parsed best-effort.
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        let raw = [&self.publish_time, &self.publish_time_snake]
            .into_iter()
            .flatten()
            .map(|t| t.trim())
            .find(|t| !t.is_empty())?;

        match DateTime::parse_from_rfc3339(raw) {
            Ok(time) => Some(time.with_timezone(&Utc)),
            Err(e) => {
                tracing::warn!("Ignoring unparseable publish time '{}': {}", raw, e);
                None
            }
        }
    }
}

/// A push delivery whose payload decoded to JSON.
#[derive(Debug, Clone)]
pub struct DecodedMessage {
    pub message_id: String,
    pub publish_time: Option<DateTime<Utc>>,
    pub subscription: Option<String>,
    pub attributes: HashMap<String, String>,
    pub payload: JsonValue,
}

impl PushEnvelope {
    /// Parse a raw request body as a push envelope.
    pub fn from_slice(body: &[u8]) -> Result<Self, EnvelopeError> {
        serde_json::from_slice(body).map_err(EnvelopeError::InvalidEnvelope)
    }

    /// Base64-decode and JSON-parse the payload.
    pub fn decode(self) -> Result<DecodedMessage, EnvelopeError> {
        let message = self.message.ok_or(EnvelopeError::MissingMessage)?;

        let message_id = message
            .id()
            .map(str::to_string)
            .ok_or(EnvelopeError::MissingMessageId)?;
        let publish_time = message.published_at();

        let data = match message.data {
            Some(data) if !data.trim().is_empty() => data,
            _ => return Err(EnvelopeError::MissingData { message_id }),
        };

        let bytes = match STANDARD.decode(data.trim()) {
            Ok(bytes) => bytes,
            Err(source) => return Err(EnvelopeError::InvalidBase64 { message_id, source }),
        };

        let payload = match serde_json::from_slice(&bytes) {
            Ok(payload) => payload,
            Err(source) => return Err(EnvelopeError::InvalidPayload { message_id, source }),
        };

        Ok(DecodedMessage {
            message_id,
            publish_time,
            subscription: self.subscription,
            attributes: message.attributes,
            payload,
        })
    }
}

/// Decode a raw push request body in one step.
pub fn decode(body: &[u8]) -> Result<DecodedMessage, EnvelopeError> {
    PushEnvelope::from_slice(body)?.decode()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope_body(data: &str, message_id: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "message": {
                "data": data,
                "messageId": message_id,
                "publishTime": "2024-01-01T00:00:00Z",
            },
            "subscription": "projects/test-project/subscriptions/intake",
        }))
        .unwrap()
    }

    #[test]
    fn test_decode_valid_envelope() {
        let payload = json!({"name": "Anna Kowalska", "email": "anna@example.com"});
        let data = STANDARD.encode(payload.to_string());

        let decoded = decode(&envelope_body(&data, "m1")).unwrap();

        assert_eq!(decoded.message_id, "m1");
        assert_eq!(decoded.payload, payload);
        assert_eq!(
            decoded.subscription.as_deref(),
            Some("projects/test-project/subscriptions/intake")
        );
        assert_eq!(
            decoded.publish_time.map(|t| t.to_rfc3339()),
            Some("2024-01-01T00:00:00+00:00".to_string())
        );
    }

    #[test]
    fn test_decode_accepts_snake_case_fields() {
        let data = STANDARD.encode(r#"{"values": []}"#);
        let body = serde_json::to_vec(&json!({
            "message": {"data": data, "message_id": "m2", "attributes": {"source": "form"}},
        }))
        .unwrap();

        let decoded = decode(&body).unwrap();
        assert_eq!(decoded.message_id, "m2");
        assert_eq!(decoded.attributes.get("source").map(String::as_str), Some("form"));
        assert!(decoded.publish_time.is_none());
    }

    #[test]
    fn test_decode_rejects_non_json_body() {
        let err = decode(b"not json at all").unwrap_err();
        assert!(matches!(err, EnvelopeError::InvalidEnvelope(_)));
    }

    #[test]
    fn test_decode_rejects_missing_message() {
        let body = serde_json::to_vec(&json!({"subscription": "s"})).unwrap();
        assert!(matches!(decode(&body).unwrap_err(), EnvelopeError::MissingMessage));
    }

    #[test]
    fn test_decode_rejects_missing_data() {
        let body = serde_json::to_vec(&json!({"message": {"messageId": "m3"}})).unwrap();
        match decode(&body).unwrap_err() {
            EnvelopeError::MissingData { message_id } => assert_eq!(message_id, "m3"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_decode_rejects_missing_message_id() {
        let data = STANDARD.encode("{}");
        let body = serde_json::to_vec(&json!({"message": {"data": data}})).unwrap();
        assert!(matches!(decode(&body).unwrap_err(), EnvelopeError::MissingMessageId));
    }

    #[test]
    fn test_decode_rejects_invalid_base64() {
        let err = decode(&envelope_body("%%% not base64 %%%", "m4")).unwrap_err();
        assert!(matches!(err, EnvelopeError::InvalidBase64 { .. }));
    }

    #[test]
    fn test_decode_rejects_invalid_payload_json() {
        let data = STANDARD.encode("invalid json data");
        let err = decode(&envelope_body(&data, "m5")).unwrap_err();
        assert!(matches!(err, EnvelopeError::InvalidPayload { .. }));
    }

    #[test]
    fn test_decode_accepts_both_field_spellings() {
        let data = STANDARD.encode(r#"{"name": "Anna Kowalska"}"#);
        let body = format!(
            r#"{{"message":{{"attributes":{{"key":"value"}},"data":"{}","messageId":"2070443601311540","message_id":"2070443601311540","publishTime":"2021-02-26T19:13:55.749Z","publish_time":"2021-02-26T19:13:55.749Z"}},"subscription":"projects/myproject/subscriptions/mysubscription"}}"#,
            data
        );

        let decoded = decode(body.as_bytes()).unwrap();

        assert_eq!(decoded.message_id, "2070443601311540");
        assert_eq!(decoded.payload, json!({"name": "Anna Kowalska"}));
        assert_eq!(decoded.attributes.get("key").map(String::as_str), Some("value"));
        assert_eq!(
            decoded.publish_time.map(|t| t.timestamp_millis()),
            Some(1_614_366_835_749)
        );
    }

    #[test]
    fn test_unparseable_publish_time_is_ignored() {
        let data = STANDARD.encode(r#"{"name": "Anna"}"#);
        let body = serde_json::to_vec(&json!({
            "message": {"data": data, "messageId": "m1", "publishTime": "yesterday"},
        }))
        .unwrap();

        let decoded = decode(&body).unwrap();

        assert_eq!(decoded.message_id, "m1");
        assert!(decoded.publish_time.is_none());
        assert_eq!(decoded.payload, json!({"name": "Anna"}));
    }
}
