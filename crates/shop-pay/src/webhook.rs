//! # Webhook Verification and Parsing
//!
//! Providers sign each delivery with `t=<unix-ts>,v1=<hex-hmac>` over
//! `"{t}.{raw body}"`. Verification is byte-sensitive: it must run over
//! the exact raw request body, before any JSON parsing.

use chrono::Utc;
use serde::Deserialize;
use shop_core::{ShopError, ShopResult};
use uuid::Uuid;

/// Accepted clock skew between the signature timestamp and now
const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<String>,
}

fn parse_signature_header(header: &str) -> ShopResult<SignatureHeader> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let kv: Vec<&str> = part.split('=').collect();
        if kv.len() != 2 {
            continue;
        }
        match kv[0] {
            "t" => {
                timestamp = kv[1].parse().ok();
            }
            "v1" => {
                signatures.push(kv[1].to_string());
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        ShopError::InvalidSignature("missing timestamp in signature".to_string())
    })?;

    if signatures.is_empty() {
        return Err(ShopError::InvalidSignature("no v1 signature found".to_string()));
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

fn compute_hmac_sha256(secret: &str, message: &[u8]) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Verify a raw webhook body against its signature header.
///
/// Rejects on header malformation, timestamp outside tolerance, or HMAC
/// mismatch. No state is touched on rejection.
pub fn verify_signature(secret: &str, payload: &[u8], header: &str) -> ShopResult<()> {
    let sig = parse_signature_header(header)?;

    let now = Utc::now().timestamp();
    if (now - sig.timestamp).abs() > TIMESTAMP_TOLERANCE_SECS {
        return Err(ShopError::InvalidSignature(
            "timestamp outside tolerance".to_string(),
        ));
    }

    let mut signed_payload = sig.timestamp.to_string().into_bytes();
    signed_payload.push(b'.');
    signed_payload.extend_from_slice(payload);
    let expected = compute_hmac_sha256(secret, &signed_payload);

    let valid = sig
        .signatures
        .iter()
        .any(|s| constant_time_compare(s, &expected));

    if !valid {
        return Err(ShopError::InvalidSignature("signature mismatch".to_string()));
    }

    Ok(())
}

/// Produce a valid signature header for a payload. Counterpart of
/// [`verify_signature`]; used by tests and local delivery tooling.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut signed_payload = timestamp.to_string().into_bytes();
    signed_payload.push(b'.');
    signed_payload.extend_from_slice(payload);
    format!("t={},v1={}", timestamp, compute_hmac_sha256(secret, &signed_payload))
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
    object: RawEventObject,
}

#[derive(Debug, Deserialize)]
struct RawEventObject {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    metadata: std::collections::HashMap<String, String>,
}

/// A verified provider event, reduced to what the reconciler acts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEvent {
    /// Terminal success for the correlated order
    Succeeded {
        order_id: Option<Uuid>,
        intent_id: Option<String>,
    },
    /// The attempt failed; the order stays open for retry
    Failed {
        order_id: Option<Uuid>,
        intent_id: Option<String>,
    },
    /// Anything else: acknowledged, no state change
    Ignored { event_type: String },
}

/// Parse a verified payload into a [`PaymentEvent`].
///
/// Missing or malformed correlation metadata degrades to `None` rather
/// than erroring: unrelated deliveries must not fail the endpoint.
pub fn parse_event(payload: &[u8]) -> ShopResult<PaymentEvent> {
    let event: RawEvent = serde_json::from_slice(payload)
        .map_err(|e| ShopError::WebhookParse(format!("failed to parse webhook: {e}")))?;

    let order_id = event
        .data
        .object
        .metadata
        .get("order_id")
        .and_then(|s| Uuid::parse_str(s).ok());
    let intent_id = event.data.object.id;

    Ok(match event.event_type.as_str() {
        "payment_intent.succeeded" => PaymentEvent::Succeeded {
            order_id,
            intent_id,
        },
        "payment_intent.payment_failed" => PaymentEvent::Failed {
            order_id,
            intent_id,
        },
        other => PaymentEvent::Ignored {
            event_type: other.to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_signature_header() {
        let header = "t=1234567890,v1=abc123,v1=def456";
        let parsed = parse_signature_header(header).unwrap();

        assert_eq!(parsed.timestamp, 1234567890);
        assert_eq!(parsed.signatures.len(), 2);
        assert_eq!(parsed.signatures[0], "abc123");
    }

    #[test]
    fn test_malformed_header_rejected() {
        assert!(parse_signature_header("v1=abc").is_err());
        assert!(parse_signature_header("t=123").is_err());
        assert!(parse_signature_header("garbage").is_err());
    }

    #[test]
    fn test_sign_and_verify_round_trip() {
        let secret = "whsec_test";
        let payload = br#"{"type":"payment_intent.succeeded"}"#;
        let header = sign_payload(secret, Utc::now().timestamp(), payload);

        assert!(verify_signature(secret, payload, &header).is_ok());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let secret = "whsec_test";
        let payload = br#"{"type":"payment_intent.succeeded","data":{"object":{"id":"pi_1"}}}"#;
        let header = sign_payload(secret, Utc::now().timestamp(), payload);

        let tampered = br#"{"type":"payment_intent.succeeded","data":{"object":{"id":"pi_2"}}}"#;
        let err = verify_signature(secret, tampered, &header).unwrap_err();
        assert!(matches!(err, ShopError::InvalidSignature(_)));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let payload = b"{}";
        let header = sign_payload("whsec_right", Utc::now().timestamp(), payload);
        assert!(verify_signature("whsec_wrong", payload, &header).is_err());
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let secret = "whsec_test";
        let payload = b"{}";
        let stale = Utc::now().timestamp() - TIMESTAMP_TOLERANCE_SECS - 10;
        let header = sign_payload(secret, stale, payload);

        let err = verify_signature(secret, payload, &header).unwrap_err();
        assert!(matches!(err, ShopError::InvalidSignature(_)));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc123", "abc123"));
        assert!(!constant_time_compare("abc123", "abc124"));
        assert!(!constant_time_compare("abc", "abcd"));
    }

    #[test]
    fn test_parse_succeeded_event() {
        let order_id = Uuid::new_v4();
        let payload = serde_json::json!({
            "id": "evt_1",
            "type": "payment_intent.succeeded",
            "data": { "object": {
                "id": "pi_123",
                "metadata": { "order_id": order_id.to_string() }
            }}
        });

        let event = parse_event(payload.to_string().as_bytes()).unwrap();
        assert_eq!(
            event,
            PaymentEvent::Succeeded {
                order_id: Some(order_id),
                intent_id: Some("pi_123".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_failed_event_without_metadata() {
        let payload = serde_json::json!({
            "type": "payment_intent.payment_failed",
            "data": { "object": { "id": "pi_9" } }
        });

        let event = parse_event(payload.to_string().as_bytes()).unwrap();
        assert_eq!(
            event,
            PaymentEvent::Failed {
                order_id: None,
                intent_id: Some("pi_9".to_string()),
            }
        );
    }

    #[test]
    fn test_unknown_event_type_is_ignored() {
        let payload = serde_json::json!({
            "type": "customer.created",
            "data": { "object": {} }
        });

        let event = parse_event(payload.to_string().as_bytes()).unwrap();
        assert_eq!(
            event,
            PaymentEvent::Ignored {
                event_type: "customer.created".to_string()
            }
        );
    }

    #[test]
    fn test_garbled_order_id_degrades_to_none() {
        let payload = serde_json::json!({
            "type": "payment_intent.succeeded",
            "data": { "object": {
                "id": "pi_1",
                "metadata": { "order_id": "not-a-uuid" }
            }}
        });

        let event = parse_event(payload.to_string().as_bytes()).unwrap();
        assert_eq!(
            event,
            PaymentEvent::Succeeded {
                order_id: None,
                intent_id: Some("pi_1".to_string()),
            }
        );
    }
}
