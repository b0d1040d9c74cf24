//! Verification of `Stripe-Signature` webhook headers.
//!
//! The header has the form `t=<unix_ts>,v1=<hex_hmac>[,v1=...]`. The signed
//! payload is `"{t}.{raw_body}"`, authenticated with HMAC-SHA256 under the
//! endpoint's signing secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Default tolerance between the signed timestamp and now.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Errors raised while verifying a webhook signature.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookSignatureError {
    #[error("Signature header is malformed")]
    MalformedHeader,

    #[error("Signature header has no timestamp")]
    MissingTimestamp,

    #[error("Signature header has no v1 signature")]
    MissingSignature,

    #[error("Signature timestamp is outside the tolerance window")]
    TimestampOutOfTolerance,

    #[error("No signature matches the payload")]
    SignatureMismatch,

    #[error("Invalid signing secret")]
    InvalidSecret,
}

/// Parsed form of a signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signatures: Vec<String>,
}

/// Parses a `t=...,v1=...` header. Unknown schemes (e.g. `v0`) are ignored.
pub fn parse_header(header: &str) -> Result<SignatureHeader, WebhookSignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let (key, value) = part
            .trim()
            .split_once('=')
            .ok_or(WebhookSignatureError::MalformedHeader)?;
        match key {
            "t" => {
                timestamp = Some(
                    value
                        .parse::<i64>()
                        .map_err(|_| WebhookSignatureError::MalformedHeader)?,
                )
            }
            "v1" => signatures.push(value.to_string()),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(WebhookSignatureError::MissingTimestamp)?;
    if signatures.is_empty() {
        return Err(WebhookSignatureError::MissingSignature);
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

/// Computes the hex `v1` signature for a payload at a timestamp.
pub fn compute_signature(
    secret: &str,
    timestamp: i64,
    payload: &[u8],
) -> Result<String, WebhookSignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| WebhookSignatureError::InvalidSecret)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verifies a signature header against the raw request body.
///
/// `now` is the current unix time in seconds. Comparison of the MAC is
/// constant-time.
pub fn verify_signature(
    secret: &str,
    header: &str,
    payload: &[u8],
    now: i64,
    tolerance_secs: i64,
) -> Result<(), WebhookSignatureError> {
    if secret.is_empty() {
        return Err(WebhookSignatureError::InvalidSecret);
    }

    let parsed = parse_header(header)?;

    if (now - parsed.timestamp).abs() > tolerance_secs {
        return Err(WebhookSignatureError::TimestampOutOfTolerance);
    }

    for candidate in &parsed.signatures {
        let Ok(expected) = hex::decode(candidate) else {
            continue;
        };
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| WebhookSignatureError::InvalidSecret)?;
        mac.update(parsed.timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        if mac.verify_slice(&expected).is_ok() {
            return Ok(());
        }
    }

    Err(WebhookSignatureError::SignatureMismatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const BODY: &[u8] = br#"{"id":"evt_1","type":"checkout.session.completed"}"#;

    fn header_for(ts: i64, body: &[u8]) -> String {
        format!("t={},v1={}", ts, compute_signature(SECRET, ts, body).unwrap())
    }

    #[test]
    fn test_parse_header() {
        let parsed = parse_header("t=1700000000,v1=abc,v0=zzz,v1=def").unwrap();
        assert_eq!(parsed.timestamp, 1_700_000_000);
        assert_eq!(parsed.signatures, vec!["abc".to_string(), "def".to_string()]);
    }

    #[test]
    fn test_parse_header_missing_parts() {
        assert_eq!(
            parse_header("v1=abc"),
            Err(WebhookSignatureError::MissingTimestamp)
        );
        assert_eq!(
            parse_header("t=1700000000"),
            Err(WebhookSignatureError::MissingSignature)
        );
        assert_eq!(
            parse_header("garbage"),
            Err(WebhookSignatureError::MalformedHeader)
        );
        assert_eq!(
            parse_header("t=notanumber,v1=abc"),
            Err(WebhookSignatureError::MalformedHeader)
        );
    }

    #[test]
    fn test_valid_signature_accepted() {
        let ts = 1_700_000_000;
        let header = header_for(ts, BODY);
        assert!(verify_signature(SECRET, &header, BODY, ts + 10, DEFAULT_TOLERANCE_SECS).is_ok());
    }

    #[test]
    fn test_any_matching_v1_accepted() {
        let ts = 1_700_000_000;
        let good = compute_signature(SECRET, ts, BODY).unwrap();
        let header = format!("t={},v1={},v1={}", ts, "00".repeat(32), good);
        assert!(verify_signature(SECRET, &header, BODY, ts, DEFAULT_TOLERANCE_SECS).is_ok());
    }

    #[test]
    fn test_tampered_body_rejected() {
        let ts = 1_700_000_000;
        let header = header_for(ts, BODY);
        let result = verify_signature(SECRET, &header, b"{}", ts, DEFAULT_TOLERANCE_SECS);
        assert_eq!(result, Err(WebhookSignatureError::SignatureMismatch));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let ts = 1_700_000_000;
        let header = header_for(ts, BODY);
        let result = verify_signature("whsec_other", &header, BODY, ts, DEFAULT_TOLERANCE_SECS);
        assert_eq!(result, Err(WebhookSignatureError::SignatureMismatch));
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let ts = 1_700_000_000;
        let header = header_for(ts, BODY);
        let result = verify_signature(SECRET, &header, BODY, ts + 301, DEFAULT_TOLERANCE_SECS);
        assert_eq!(result, Err(WebhookSignatureError::TimestampOutOfTolerance));
    }

    #[test]
    fn test_empty_secret_rejected() {
        let result = verify_signature("", "t=1,v1=ab", BODY, 1, DEFAULT_TOLERANCE_SECS);
        assert_eq!(result, Err(WebhookSignatureError::InvalidSecret));
    }

    #[test]
    fn test_non_hex_signature_is_mismatch() {
        let ts = 1_700_000_000;
        let header = format!("t={},v1=not-hex", ts);
        let result = verify_signature(SECRET, &header, BODY, ts, DEFAULT_TOLERANCE_SECS);
        assert_eq!(result, Err(WebhookSignatureError::SignatureMismatch));
    }
}
