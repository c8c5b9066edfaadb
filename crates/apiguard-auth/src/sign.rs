//! Request signature verification.
//!
//! Callers sign `app + "_" + timestamp + "_" + secret` with MD5 and send the
//! lowercase hex digest alongside the timestamp.

use md5::{Digest, Md5};
use subtle::ConstantTimeEq;

/// Compute the signature a caller is expected to send.
#[must_use]
pub fn expected_sign(app: &str, timestamp: &str, secret_key: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(app.as_bytes());
    hasher.update(b"_");
    hasher.update(timestamp.as_bytes());
    hasher.update(b"_");
    hasher.update(secret_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check a caller's signature in constant time.
#[must_use]
pub fn verify(app: &str, timestamp: &str, secret_key: &str, sign: &str) -> bool {
    let expected = expected_sign(app, timestamp, secret_key);
    expected.as_bytes().ct_eq(sign.as_bytes()).into()
}
