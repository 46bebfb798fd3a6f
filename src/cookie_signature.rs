//! Signed cookie support
//!
//! A signed cookie `name=value` travels with a companion cookie
//! `name.sig=<signature>`, where the signature is
//! `base64url(hmac_sha256(key, "name=value"))` without padding.
//! The first key signs, every key is accepted when verifying so that keys
//! can be rotated.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Name of the companion cookie that carries the signature of `name`
pub fn signature_cookie_name(name: &str) -> String {
    format!("{}.sig", name)
}

/// Sign `name=value` with `key`
pub fn sign(name: &str, value: &str, key: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(name.as_bytes());
    mac.update(b"=");
    mac.update(value.as_bytes());
    URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}

/// Find the key that produced `signature`.
///
/// Returns the index of the matching key, `None` when no key matches.
pub fn verify(name: &str, value: &str, signature: &str, keys: &[String]) -> Option<usize> {
    keys.iter()
        .position(|key| constant_time_compare(&sign(name, value, key), signature))
}

/// Constant-time string comparison to prevent timing attacks
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
