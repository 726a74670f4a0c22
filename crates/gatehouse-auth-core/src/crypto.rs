//! Cryptographic utilities
//!
//! Token hashing, opaque secret generation, and constant-time comparison.
//! These are the primitives that must not leak timing information.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Byte length of generated refresh-token secrets (256 bits of entropy)
pub const REFRESH_SECRET_BYTES: usize = 32;

/// Generate an opaque refresh-token secret from the OS CSPRNG.
///
/// The returned string is what the caller receives; only its hash is ever
/// persisted.
pub fn generate_refresh_secret() -> String {
    let mut bytes = [0u8; REFRESH_SECRET_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a token secret for storage.
///
/// SHA-256, hex-encoded. One-way: a leaked ledger row cannot be turned
/// back into a usable refresh token.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-time byte slice comparison.
///
/// Returns `false` immediately when lengths differ (length is not secret);
/// otherwise comparison time is independent of where the slices differ.
#[inline]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
