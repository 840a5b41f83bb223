//! Payment provider webhook signature verification.
//!
//! The provider signs each webhook delivery with HMAC-SHA256 over
//! `"{timestamp}.{raw_body}"` and carries the result in the
//! `Stripe-Signature` header as `t=<unix>,v1=<hex>`. Verification must
//! run over the exact bytes received on the wire; the payload is only
//! parsed after the signature checks out.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use thiserror::Error;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Why an envelope failed verification.
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("malformed signature header")]
    MalformedHeader,

    #[error("signature header is missing a timestamp")]
    MissingTimestamp,

    #[error("signature header is missing a v1 signature")]
    MissingSignature,

    #[error("signature is not valid hex")]
    InvalidHex,

    #[error("signing key rejected")]
    InvalidKey,

    #[error("webhook timestamp outside tolerance")]
    StaleTimestamp,

    #[error("signature does not match payload")]
    Mismatch,

    #[error("verified payload is not a valid event: {0}")]
    MalformedPayload(#[source] serde_json::Error),
}

/// An event whose envelope passed signature verification.
///
/// There is deliberately no public constructor and no `Deserialize`
/// impl: the only way to obtain a value is [`verify_event`], so holding
/// one proves the raw bytes were authenticated against the shared
/// secret.
#[derive(Debug, Clone)]
pub struct VerifiedEvent {
    id: String,
    event_type: String,
    object: Value,
    created: u64,
}

impl VerifiedEvent {
    /// Provider-assigned event id (e.g. `evt_...`).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Event type tag (e.g. `checkout.session.completed`).
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// The `data.object` payload specific to the event type.
    pub fn object(&self) -> &Value {
        &self.object
    }

    /// Unix timestamp the provider created the event at.
    pub fn created(&self) -> u64 {
        self.created
    }
}

/// Wire shape of the event envelope. Parsed only after verification.
/// Only `type` and `data.object` are required; test fixtures and older
/// provider API versions omit the rest.
#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(default)]
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
    #[serde(default)]
    created: u64,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
    object: Value,
}

/// Verify a signed webhook envelope and parse it into a [`VerifiedEvent`].
///
/// # Arguments
///
/// * `payload` - The unmodified request body bytes
/// * `header` - The `Stripe-Signature` header value
/// * `secret` - The shared webhook signing secret
/// * `tolerance` - Maximum allowed age of the signed timestamp
pub fn verify_event(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance: Duration,
) -> Result<VerifiedEvent, SignatureError> {
    let parts = parse_signature_header(header)?;

    // Reject stale timestamps (replay protection)
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;

    let age = (now - parts.timestamp).unsigned_abs();
    if age > tolerance.as_secs() {
        warn!(
            webhook_timestamp = parts.timestamp,
            age_seconds = age,
            tolerance_seconds = tolerance.as_secs(),
            "webhook_signature_stale"
        );
        return Err(SignatureError::StaleTimestamp);
    }

    let provided = hex::decode(&parts.signature).map_err(|_| SignatureError::InvalidHex)?;
    let expected = compute_signature(secret, parts.timestamp, payload)?;

    if !constant_time_compare(&expected, &provided) {
        warn!(
            payload_length = payload.len(),
            "webhook_signature_mismatch"
        );
        return Err(SignatureError::Mismatch);
    }

    let raw: RawEvent = serde_json::from_slice(payload).map_err(|e| {
        warn!(error = %e, "webhook_payload_malformed");
        SignatureError::MalformedPayload(e)
    })?;

    Ok(VerifiedEvent {
        id: raw.id,
        event_type: raw.event_type,
        object: raw.data.object,
        created: raw.created,
    })
}

/// Parsed pieces of the signature header.
struct SignatureParts {
    timestamp: i64,
    signature: String,
}

/// Parse a `t=<unix>,v1=<hex>` signature header. Unknown schemes are
/// ignored so the provider can roll new signature versions.
fn parse_signature_header(header: &str) -> Result<SignatureParts, SignatureError> {
    let mut timestamp = None;
    let mut signature = None;

    for part in header.split(',') {
        let Some((key, value)) = part.split_once('=') else {
            return Err(SignatureError::MalformedHeader);
        };

        match key.trim() {
            "t" => timestamp = value.trim().parse().ok(),
            "v1" => signature = Some(value.trim().to_string()),
            _ => {}
        }
    }

    Ok(SignatureParts {
        timestamp: timestamp.ok_or(SignatureError::MissingTimestamp)?,
        signature: signature.ok_or(SignatureError::MissingSignature)?,
    })
}

/// HMAC-SHA256 over `"{timestamp}.{payload}"` with the shared secret.
fn compute_signature(
    secret: &str,
    timestamp: i64,
    payload: &[u8],
) -> Result<Vec<u8>, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidKey)?;

    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    Ok(mac.finalize().into_bytes().to_vec())
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b) {
        result |= x ^ y;
    }
    result == 0
}

/// Build a valid signature header for a payload. Test use only.
#[cfg(test)]
pub(crate) fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let digest = compute_signature(secret, timestamp, payload).unwrap();
    format!("t={},v1={}", timestamp, hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now_secs() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64
    }

    const SECRET: &str = "whsec_test_secret";
    const TOLERANCE: Duration = Duration::from_secs(300);

    fn event_body() -> Vec<u8> {
        br#"{"id":"evt_1","type":"checkout.session.completed","data":{"object":{"id":"sess_123"}},"created":1700000000}"#
            .to_vec()
    }

    #[test]
    fn test_parse_signature_header() {
        let parts = parse_signature_header("t=1234567890,v1=abc123def456").unwrap();
        assert_eq!(parts.timestamp, 1234567890);
        assert_eq!(parts.signature, "abc123def456");
    }

    #[test]
    fn test_parse_signature_header_ignores_other_schemes() {
        let parts = parse_signature_header("t=42,v0=old,v1=deadbeef").unwrap();
        assert_eq!(parts.timestamp, 42);
        assert_eq!(parts.signature, "deadbeef");
    }

    #[test]
    fn test_parse_signature_header_invalid() {
        assert!(matches!(
            parse_signature_header("garbage"),
            Err(SignatureError::MalformedHeader)
        ));
        assert!(matches!(
            parse_signature_header("v1=deadbeef"),
            Err(SignatureError::MissingTimestamp)
        ));
        assert!(matches!(
            parse_signature_header("t=42"),
            Err(SignatureError::MissingSignature)
        ));
    }

    #[test]
    fn test_verify_event_valid() {
        let body = event_body();
        let header = sign_payload(SECRET, now_secs(), &body);

        let event = verify_event(&body, &header, SECRET, TOLERANCE).unwrap();
        assert_eq!(event.id(), "evt_1");
        assert_eq!(event.event_type(), "checkout.session.completed");
        assert_eq!(event.object()["id"], "sess_123");
        assert_eq!(event.created(), 1700000000);
    }

    #[test]
    fn test_verify_event_wrong_secret() {
        let body = event_body();
        let header = sign_payload("whsec_other_secret", now_secs(), &body);

        assert!(matches!(
            verify_event(&body, &header, SECRET, TOLERANCE),
            Err(SignatureError::Mismatch)
        ));
    }

    #[test]
    fn test_verify_event_tampered_payload() {
        let body = event_body();
        let header = sign_payload(SECRET, now_secs(), &body);

        let mut tampered = body.clone();
        let index = tampered.len() / 2;
        tampered[index] ^= 0x01;

        assert!(matches!(
            verify_event(&tampered, &header, SECRET, TOLERANCE),
            Err(SignatureError::Mismatch)
        ));
    }

    #[test]
    fn test_verify_event_corrupted_signature_byte() {
        let body = event_body();
        let header = sign_payload(SECRET, now_secs(), &body);

        // Flip one hex digit of the digest
        let corrupted = if header.ends_with('0') {
            format!("{}1", &header[..header.len() - 1])
        } else {
            format!("{}0", &header[..header.len() - 1])
        };

        assert!(matches!(
            verify_event(&body, &corrupted, SECRET, TOLERANCE),
            Err(SignatureError::Mismatch)
        ));
    }

    #[test]
    fn test_verify_event_stale_timestamp() {
        let body = event_body();
        // Year 2000
        let header = sign_payload(SECRET, 946684800, &body);

        assert!(matches!(
            verify_event(&body, &header, SECRET, TOLERANCE),
            Err(SignatureError::StaleTimestamp)
        ));
    }

    #[test]
    fn test_verify_event_failure_is_deterministic() {
        let body = event_body();
        let header = sign_payload("whsec_other_secret", now_secs(), &body);

        for _ in 0..2 {
            assert!(matches!(
                verify_event(&body, &header, SECRET, TOLERANCE),
                Err(SignatureError::Mismatch)
            ));
        }
    }

    #[test]
    fn test_verify_event_malformed_payload() {
        let body = b"not json at all".to_vec();
        let header = sign_payload(SECRET, now_secs(), &body);

        // Signature over the garbage bytes is valid; parsing still fails
        assert!(matches!(
            verify_event(&body, &header, SECRET, TOLERANCE),
            Err(SignatureError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare(b"abc", b"abc"));
        assert!(!constant_time_compare(b"abc", b"abd"));
        assert!(!constant_time_compare(b"abc", b"abcd"));
    }
}
