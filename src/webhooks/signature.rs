//! HMAC-SHA1 payload signatures.
//!
//! Each delivery carries an `X-Hub-Signature` header of the form
//! `sha1=<hex>`, the HMAC-SHA1 of the raw body under the shared secret.
//! This module computes, formats, and verifies that signature; the
//! authenticator calls [`verify_signature`] as the last transport-level
//! check, so an unsigned or tampered body never reaches the payload parser.

use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Decodes a `sha1=<hex>` header value into the raw signature bytes.
///
/// Anything that is not exactly that shape (no prefix, a different
/// algorithm tag, bad hex) yields `None` and is treated as a mismatch by
/// the caller.
///
/// # Examples
///
/// ```
/// use tracker_bridge::webhooks::parse_signature_header;
///
/// // Valid header
/// let sig = parse_signature_header("sha1=abcd1234");
/// assert!(sig.is_some());
///
/// // Invalid: missing prefix
/// assert!(parse_signature_header("abcd1234").is_none());
///
/// // Invalid: wrong algorithm
/// assert!(parse_signature_header("sha256=abcd1234").is_none());
///
/// // Invalid: bad hex
/// assert!(parse_signature_header("sha1=xyz").is_none());
/// ```
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    let hex_sig = header.strip_prefix("sha1=")?;
    hex::decode(hex_sig).ok()
}

/// HMAC-SHA1 of a payload under the given secret.
///
/// This is the signing side; the service itself only verifies, but tests
/// and local senders need it to produce valid headers.
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha1::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Renders raw signature bytes as a `sha1=<hex>` header value.
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("sha1={}", hex::encode(signature))
}

/// Checks a delivery's signature header against its raw body.
///
/// `signature_header` is the full `X-Hub-Signature` value, `sha1=` prefix
/// included. Malformed headers count as a mismatch. The comparison runs in
/// constant time.
///
/// # Examples
///
/// ```
/// use tracker_bridge::webhooks::{verify_signature, compute_signature, format_signature_header};
///
/// let payload = b"Hello, World!";
/// let secret = b"my-secret-key";
///
/// // Compute and format the expected signature
/// let sig = compute_signature(payload, secret);
/// let header = format_signature_header(&sig);
///
/// // Verification should succeed
/// assert!(verify_signature(payload, &header, secret));
///
/// // Verification should fail with wrong secret
/// assert!(!verify_signature(payload, &header, b"wrong-secret"));
/// ```
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let supplied = match parse_signature_header(signature_header) {
        Some(sig) => sig,
        None => return false,
    };

    let mut mac = match HmacSha1::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload);

    // verify_slice is the constant-time path
    mac.verify_slice(&supplied).is_ok()
}
