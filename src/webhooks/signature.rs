//! GitHub webhook signature verification using HMAC-SHA1.
//!
//! GitHub signs webhook payloads using HMAC-SHA1 with a shared secret and
//! delivers the result in the `x-hub-signature` header as `sha1=<hex>`.
//!
//! Verification happens over the fully buffered raw body, before the payload
//! is parsed or trusted for any decision. Comparison is constant-time via the
//! HMAC library's verifier; on mismatch the gateway logs both the provided
//! and the computed header values (never the secret), which is what
//! [`compute_signature`] and [`format_signature_header`] are for.

use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Parses a signature header (e.g., "sha1=abc123...") into raw bytes.
///
/// Returns `None` for malformed headers (missing prefix, invalid hex, etc.).
/// Never panics.
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    let hex_sig = header.strip_prefix("sha1=")?;
    hex::decode(hex_sig).ok()
}

/// Computes the HMAC-SHA1 signature of a payload using the given secret.
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha1::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Formats a signature as a GitHub-style header value, `sha1=<hex>`.
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("sha1={}", hex::encode(signature))
}

/// Verifies a webhook signature against the payload and secret.
///
/// Returns `true` if the signature is valid, `false` otherwise. Malformed
/// headers fail verification rather than erroring.
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let provided = match parse_signature_header(signature_header) {
        Some(sig) => sig,
        None => return false,
    };

    let mut mac = match HmacSha1::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload);

    // Constant-time comparison via the HMAC library
    mac.verify_slice(&provided).is_ok()
}
