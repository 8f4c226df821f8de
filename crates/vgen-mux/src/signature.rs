//! Mux webhook signature verification.
//!
//! Mux signs each delivery with a `Mux-Signature: t=<unix>,v1=<hex>` header,
//! where `v1` is HMAC-SHA256 over `"{t}.{raw body}"` keyed by the webhook
//! signing secret.

use std::time::Duration;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{MuxError, MuxResult};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the delivery signature (lowercase, as axum normalizes it).
pub const SIGNATURE_HEADER: &str = "mux-signature";

struct ParsedHeader {
    timestamp: i64,
    signatures: Vec<Vec<u8>>,
}

fn parse_header(header: &str) -> MuxResult<ParsedHeader> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => {
                timestamp = Some(
                    value
                        .parse::<i64>()
                        .map_err(|_| MuxError::invalid_signature("timestamp is not a number"))?,
                );
            }
            "v1" => {
                if let Ok(bytes) = hex::decode(value) {
                    signatures.push(bytes);
                }
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| MuxError::invalid_signature("missing timestamp"))?;
    if signatures.is_empty() {
        return Err(MuxError::invalid_signature("missing v1 signature"));
    }

    Ok(ParsedHeader {
        timestamp,
        signatures,
    })
}

fn mac_for(payload: &[u8], timestamp: i64, secret: &str) -> MuxResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| MuxError::config("invalid webhook signing secret"))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Compute the raw `v1` signature for a payload.
pub fn compute_signature(payload: &[u8], timestamp: i64, secret: &str) -> MuxResult<Vec<u8>> {
    Ok(mac_for(payload, timestamp, secret)?
        .finalize()
        .into_bytes()
        .to_vec())
}

/// Render a header value in the format Mux sends.
pub fn format_signature_header(timestamp: i64, signature: &[u8]) -> String {
    format!("t={},v1={}", timestamp, hex::encode(signature))
}

/// Verify a webhook delivery.
///
/// Accepts the delivery if any `v1` entry matches and the timestamp is
/// within `tolerance` of `now_unix` in either direction.
pub fn verify_webhook_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance: Duration,
    now_unix: i64,
) -> MuxResult<()> {
    let parsed = parse_header(header)?;

    let age = now_unix.saturating_sub(parsed.timestamp).unsigned_abs();
    if age > tolerance.as_secs() {
        return Err(MuxError::invalid_signature(format!(
            "timestamp outside tolerance ({}s old)",
            age
        )));
    }

    for signature in &parsed.signatures {
        let mac = mac_for(payload, parsed.timestamp, secret)?;
        if mac.verify_slice(signature).is_ok() {
            return Ok(());
        }
    }

    Err(MuxError::invalid_signature("signature mismatch"))
}
