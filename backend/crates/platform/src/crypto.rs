//! Cryptographic Utilities

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use rand::{RngCore, rngs::OsRng};
use sha2::Sha256;

/// Generate cryptographically secure random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Generate an opaque, unguessable token: 32 random bytes, base64url
pub fn secure_token() -> String {
    URL_SAFE_NO_PAD.encode(random_bytes(32))
}

/// Encode bytes as base64url (no padding)
pub fn to_base64url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode base64url (no padding) to bytes
pub fn from_base64url(s: &str) -> Option<Vec<u8>> {
    URL_SAFE_NO_PAD.decode(s).ok()
}

/// Sign a value with HMAC-SHA256, producing `value.signature`
///
/// The signature is base64url-encoded; that alphabet never contains `.`,
/// so the pair splits unambiguously on the last dot.
pub fn sign_value(secret: &[u8], value: &str) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(value.as_bytes());
    let signature = mac.finalize().into_bytes();

    format!("{}.{}", value, URL_SAFE_NO_PAD.encode(signature))
}

/// Verify a `value.signature` pair, returning the value on success
pub fn verify_value(secret: &[u8], signed: &str) -> Option<String> {
    let (value, signature_b64) = signed.rsplit_once('.')?;
    let signature = URL_SAFE_NO_PAD.decode(signature_b64).ok()?;

    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(value.as_bytes());
    mac.verify_slice(&signature).ok()?;

    Some(value.to_string())
}

/// Constant-time comparison to prevent timing attacks
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
