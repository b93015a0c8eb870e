//! `X-Hub-Signature-256` signing and verification.

use {
    hmac::{Hmac, Mac},
    sha2::Sha256,
    tracing::warn,
};

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the payload signature.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

const SIGNATURE_PREFIX: &str = "sha256=";

/// Hex-encoded HMAC-SHA256 of `body` keyed with `secret`.
///
/// Fails only when the secret is empty.
pub fn sign(body: &[u8], secret: &[u8]) -> Result<String> {
    if secret.is_empty() {
        return Err(Error::Signing("webhook secret is empty".into()));
    }
    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|e| Error::Signing(e.to_string()))?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Full header value: `sha256=<hex>`.
pub fn signature_header(body: &[u8], secret: &[u8]) -> Result<String> {
    Ok(format!("{SIGNATURE_PREFIX}{}", sign(body, secret)?))
}

/// Check an `X-Hub-Signature-256` header value against `body`.
pub fn verify(body: &[u8], header: &str, secret: &[u8]) -> bool {
    let Some(expected) = header.trim().strip_prefix(SIGNATURE_PREFIX) else {
        warn!("invalid signature header format (missing sha256= prefix)");
        return false;
    };

    match sign(body, secret) {
        Ok(computed) => constant_time_eq(&computed, &expected.to_ascii_lowercase()),
        Err(e) => {
            warn!(error = %e, "cannot verify signature");
            false
        },
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}
