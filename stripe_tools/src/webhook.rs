//! Stripe webhook signature verification.
//!
//! Stripe signs each webhook delivery with the endpoint's signing secret. The `Stripe-Signature` header looks like
//!
//! ```text
//! t=1492774577,v1=5257a869e7ecebeda32affa62cdca3fa51cad7e77a0e56ff536d0ce8e108d8bd,v0=6ffbb59b2300aae63f27240...
//! ```
//!
//! `t` is the unix time of the delivery and each `v1` entry is the hex-encoded HMAC-SHA256 of `"{t}.{body}"`. Any
//! one matching `v1` signature is sufficient. Other schemes (`v0`) are ignored.
use std::time::Duration;

use hmac::{Hmac, Mac};
use log::*;
use sha2::Sha256;

use crate::{data_objects::StripeEvent, WebhookError};

pub const SIGNATURE_HEADER: &str = "Stripe-Signature";
const SIGNATURE_SCHEME: &str = "v1";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signatures: Vec<String>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp = None;
        let mut signatures = Vec::new();
        for pair in header.split(',') {
            let (key, value) = match pair.trim().split_once('=') {
                Some(kv) => kv,
                None => continue,
            };
            match key {
                "t" => {
                    let t = value
                        .parse::<i64>()
                        .map_err(|_| WebhookError::SignatureInvalid(format!("Invalid timestamp: {value}")))?;
                    timestamp = Some(t);
                },
                SIGNATURE_SCHEME => signatures.push(value.to_string()),
                _ => {},
            }
        }
        let timestamp =
            timestamp.ok_or_else(|| WebhookError::SignatureInvalid("No timestamp in signature header".into()))?;
        if signatures.is_empty() {
            return Err(WebhookError::SignatureInvalid(format!("No {SIGNATURE_SCHEME} signatures in header")));
        }
        Ok(Self { timestamp, signatures })
    }
}

/// Calculates the hex-encoded `v1` signature of `payload` as Stripe would for the given timestamp.
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    hex::encode(signing_mac(secret, timestamp, payload).finalize().into_bytes())
}

fn signing_mac(secret: &str, timestamp: i64, payload: &[u8]) -> HmacSha256 {
    // HMAC accepts keys of any length, so this cannot fail
    #[allow(clippy::expect_used)]
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac
}

/// Checks the signature header against the payload.
///
/// `now` is the current unix time. Deliveries whose timestamp is more than `tolerance` away from `now` are rejected
/// so that captured requests cannot be replayed later.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance: Duration,
    now: i64,
) -> Result<(), WebhookError> {
    if secret.is_empty() {
        return Err(WebhookError::SignatureInvalid("No webhook signing secret is configured".into()));
    }
    let header = SignatureHeader::parse(header)?;
    let matched = header.signatures.iter().any(|sig| match hex::decode(sig) {
        // verify_slice does a constant-time comparison
        Ok(bytes) => signing_mac(secret, header.timestamp, payload).verify_slice(&bytes).is_ok(),
        Err(_) => false,
    });
    if !matched {
        return Err(WebhookError::SignatureInvalid("No signature matches the payload".into()));
    }
    let age = now.saturating_sub(header.timestamp).unsigned_abs();
    if age > tolerance.as_secs() {
        return Err(WebhookError::SignatureInvalid(format!(
            "Timestamp is outside the tolerance window ({age}s > {}s)",
            tolerance.as_secs()
        )));
    }
    Ok(())
}

/// Verifies the signature and then parses the payload into a [`StripeEvent`].
pub fn construct_event(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance: Duration,
) -> Result<StripeEvent, WebhookError> {
    let now = chrono::Utc::now().timestamp();
    verify_signature(payload, header, secret, tolerance, now)?;
    trace!("🔐️ Stripe webhook signature verified");
    serde_json::from_slice::<StripeEvent>(payload).map_err(|e| WebhookError::Malformed(e.to_string()))
}
