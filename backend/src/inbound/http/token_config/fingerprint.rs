//! Signing key fingerprinting for operational visibility.
//!
//! A truncated SHA-256 digest lets operators confirm which key is active
//! without exposing the key material. The fingerprint is logged on startup.

use sha2::{Digest, Sha256};

/// Length of the fingerprint in bytes before hex encoding.
const FINGERPRINT_BYTES: usize = 8;

/// Return the first 8 bytes of the key's SHA-256 digest as lowercase hex.
///
/// # Examples
///
/// ```rust
/// use upvote::inbound::http::token_config::fingerprint::key_fingerprint;
///
/// let fp = key_fingerprint(&[b'a'; 32]);
/// assert_eq!(fp.len(), 16);
/// assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
/// ```
#[must_use]
pub fn key_fingerprint(key: &[u8]) -> String {
    let digest = Sha256::digest(key);
    hex::encode(digest.get(..FINGERPRINT_BYTES).unwrap_or_default())
}
