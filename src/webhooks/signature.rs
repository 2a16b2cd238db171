//! Notion webhook signature verification using HMAC-SHA256.
//!
//! Notion signs each event delivery with HMAC-SHA256, keyed by the verification
//! token it sent during the subscription handshake. The signature is provided
//! in the `X-Notion-Signature` header as `sha256=<lowercase hex>`.
//!
//! Verification compares the whole header string against the expected value,
//! so any single-byte change (including hex case) fails. Invalid signatures are
//! rejected before an event is classified or any job is scheduled.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Prefix of every signature header value.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Computes the raw HMAC-SHA256 of a payload.
pub fn compute_signature(secret: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Signs a payload, returning the header value `sha256=<hex>`.
///
/// # Examples
///
/// ```
/// use sprint_namer::webhooks::sign;
///
/// let header = sign(b"secret", b"{}");
/// assert!(header.starts_with("sha256="));
/// assert_eq!(header.len(), "sha256=".len() + 64);
/// ```
pub fn sign(secret: &[u8], payload: &[u8]) -> String {
    format!(
        "{SIGNATURE_PREFIX}{}",
        hex::encode(compute_signature(secret, payload))
    )
}

/// Verifies a signature header against the payload and secret.
///
/// Returns `false` (never panics) when the secret is empty, the header is
/// missing, or the header does not match. Lengths are compared first; equal
/// length values are compared in constant time.
///
/// # Examples
///
/// ```
/// use sprint_namer::webhooks::{sign, verify};
///
/// let payload = br#"{"type":"page.created"}"#;
/// let header = sign(b"token", payload);
///
/// assert!(verify(b"token", payload, Some(&header)));
/// assert!(!verify(b"other", payload, Some(&header)));
/// assert!(!verify(b"token", payload, None));
/// ```
pub fn verify(secret: &[u8], payload: &[u8], provided: Option<&str>) -> bool {
    if secret.is_empty() {
        return false;
    }
    let Some(provided) = provided else {
        return false;
    };

    let expected = sign(secret, payload);
    if expected.len() != provided.len() {
        return false;
    }

    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}
