//! Signing keyring with rotation snapshots
//!
//! Key material is loaded at startup and never mutated in place. Rotation
//! consumes the old keyring and produces a new snapshot in which the
//! previous current key is retained for verification only, inside a
//! configurable grace window. New tokens are always signed with the
//! current key.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey};
use std::time::Duration;

use crate::AuthError;

/// A named HMAC signing key
#[derive(Clone)]
pub struct SigningKey {
    kid: String,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    /// Minimum allowed secret length in bytes (256 bits)
    pub const MIN_SECRET_LENGTH: usize = 32;

    /// Create a signing key from raw secret bytes.
    ///
    /// # Errors
    /// Returns `Configuration` if the secret is shorter than 32 bytes.
    pub fn new(kid: impl Into<String>, secret: impl AsRef<[u8]>) -> Result<Self, AuthError> {
        let secret = secret.as_ref();
        if secret.len() < Self::MIN_SECRET_LENGTH {
            return Err(AuthError::Configuration(format!(
                "signing secret too short: got {} bytes, need at least {}",
                secret.len(),
                Self::MIN_SECRET_LENGTH
            )));
        }
        Ok(Self {
            kid: kid.into(),
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        })
    }

    /// Key ID placed in token headers
    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub(crate) fn encoding(&self) -> &EncodingKey {
        &self.encoding
    }

    pub(crate) fn decoding(&self) -> &DecodingKey {
        &self.decoding
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .finish_non_exhaustive()
    }
}

/// A retired key kept for grace-window verification
#[derive(Debug, Clone)]
struct RetiredKey {
    key: SigningKey,
    rotated_at: DateTime<Utc>,
}

/// Immutable snapshot of live signing keys
#[derive(Debug, Clone)]
pub struct Keyring {
    current: SigningKey,
    previous: Vec<RetiredKey>,
}

impl Keyring {
    /// Create a keyring with a single current key
    pub fn new(current: SigningKey) -> Self {
        Self {
            current,
            previous: Vec::new(),
        }
    }

    /// Produce the next snapshot: `next` becomes current, the old current
    /// key is retired at `now` and kept for verification only.
    pub fn rotated(self, next: SigningKey, now: DateTime<Utc>) -> Self {
        let mut previous = self.previous;
        previous.push(RetiredKey {
            key: self.current,
            rotated_at: now,
        });
        Self {
            current: next,
            previous,
        }
    }

    /// The key used to sign new tokens
    pub fn current(&self) -> &SigningKey {
        &self.current
    }

    /// Look up a verification key by `kid`.
    ///
    /// The current key always verifies. A retired key verifies only while
    /// `now` is within `grace` of its rotation time.
    pub(crate) fn decoding_key(
        &self,
        kid: &str,
        now: DateTime<Utc>,
        grace: Duration,
    ) -> Option<&DecodingKey> {
        if self.current.kid == kid {
            return Some(self.current.decoding());
        }
        let grace = ChronoDuration::from_std(grace).unwrap_or(ChronoDuration::MAX);
        self.previous
            .iter()
            .find(|r| r.key.kid == kid && now - r.rotated_at <= grace)
            .map(|r| r.key.decoding())
    }
}
