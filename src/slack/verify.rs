//! Inbound request verification.
//!
//! Every payload Slack delivers carries the app's verification token. When a
//! signing secret is configured the request signature is checked as well:
//! <https://api.slack.com/authentication/verifying-requests-from-slack>

use axum::http::HeaderMap;
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use crate::error::VerificationError;

/// Slack signature version prefix.
pub const SIGNATURE_VERSION: &str = "v0";

/// Maximum allowed clock skew for signed requests.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

type HmacSha256 = Hmac<Sha256>;

/// Check the verification token embedded in a payload.
pub fn verify_token(expected: &SecretString, provided: &str) -> Result<(), VerificationError> {
    if constant_time_eq(expected.expose_secret(), provided) {
        Ok(())
    } else {
        Err(VerificationError::TokenMismatch)
    }
}

/// Check the signature headers of a request against its raw body.
pub fn verify_request(
    signing_secret: &SecretString,
    headers: &HeaderMap,
    body: &[u8],
    now: i64,
) -> Result<(), VerificationError> {
    let timestamp = header_str(headers, TIMESTAMP_HEADER)?;
    let signature = header_str(headers, SIGNATURE_HEADER)?;
    verify_signature(signing_secret, timestamp, body, signature, now)
}

/// Verify `v0=<hex hmac-sha256("v0:{timestamp}:{body}")>`.
pub fn verify_signature(
    signing_secret: &SecretString,
    timestamp: &str,
    body: &[u8],
    signature: &str,
    now: i64,
) -> Result<(), VerificationError> {
    let ts: i64 = timestamp
        .trim()
        .parse()
        .map_err(|_| VerificationError::InvalidTimestamp(timestamp.to_string()))?;

    let age_secs = now - ts;
    if age_secs.abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(VerificationError::StaleTimestamp { age_secs });
    }

    let provided = signature
        .strip_prefix(SIGNATURE_VERSION)
        .and_then(|rest| rest.strip_prefix('='))
        .and_then(|digest| hex::decode(digest).ok())
        .ok_or(VerificationError::SignatureMismatch)?;

    let mut mac = HmacSha256::new_from_slice(signing_secret.expose_secret().as_bytes())
        .map_err(|_| VerificationError::SignatureMismatch)?;
    mac.update(format!("{SIGNATURE_VERSION}:{timestamp}:").as_bytes());
    mac.update(body);

    mac.verify_slice(&provided)
        .map_err(|_| VerificationError::SignatureMismatch)
}

/// Compute the signature header value for a body, the way Slack does.
pub fn sign(
    signing_secret: &SecretString,
    timestamp: i64,
    body: &[u8],
) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(signing_secret.expose_secret().as_bytes())?;
    mac.update(format!("{SIGNATURE_VERSION}:{timestamp}:").as_bytes());
    mac.update(body);
    Ok(format!(
        "{SIGNATURE_VERSION}={}",
        hex::encode(mac.finalize().into_bytes())
    ))
}

fn header_str<'a>(
    headers: &'a HeaderMap,
    name: &'static str,
) -> Result<&'a str, VerificationError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or(VerificationError::MissingHeader(name))
}

/// Constant-time string comparison.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}
