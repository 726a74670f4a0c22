//! Password hashing with bcrypt
//!
//! bcrypt digests embed their own salt and cost factor, so `verify` needs
//! no configuration beyond the stored digest itself.

use crate::AuthError;

/// Password hasher with a fixed cost factor
///
/// Holds a precomputed dummy digest so login can burn the same bcrypt cost
/// when the email does not exist, keeping the two failure paths
/// indistinguishable by timing.
#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
    dummy_digest: String,
}

impl PasswordHasher {
    /// Create a hasher with the given bcrypt cost factor.
    ///
    /// # Errors
    /// Returns `Configuration` if the cost is outside bcrypt's 4..=31 range.
    pub fn new(cost: u32) -> Result<Self, AuthError> {
        if !(4..=31).contains(&cost) {
            return Err(AuthError::Configuration(format!(
                "bcrypt cost {cost} outside 4..=31"
            )));
        }
        let dummy_digest = bcrypt::hash("gatehouse-equalizer", cost)
            .map_err(|e| AuthError::Configuration(format!("bcrypt self-check failed: {e}")))?;
        Ok(Self { cost, dummy_digest })
    }

    /// Hash a plaintext password. The digest embeds salt and cost.
    pub fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        bcrypt::hash(plaintext, self.cost).map_err(|e| {
            tracing::error!("password hashing failed: {}", e);
            AuthError::Internal("password hashing failed".to_string())
        })
    }

    /// Verify a plaintext password against a stored digest.
    ///
    /// A mismatch is `Ok(false)`, never an error. A digest that bcrypt
    /// cannot parse is storage corruption and surfaces as
    /// `CorruptCredential`.
    pub fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, AuthError> {
        bcrypt::verify(plaintext, digest).map_err(|e| {
            tracing::error!("stored password digest is unreadable: {}", e);
            AuthError::CorruptCredential
        })
    }

    /// Burn one bcrypt verification against the dummy digest.
    ///
    /// Called when no user record exists, so the unknown-email path costs
    /// the same as a wrong-password path.
    pub fn burn(&self, plaintext: &str) {
        let _ = bcrypt::verify(plaintext, &self.dummy_digest);
    }
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("cost", &self.cost)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Cost 4 keeps the test suite fast; production default is 10.
    fn hasher() -> PasswordHasher {
        PasswordHasher::new(4).unwrap()
    }

    #[test]
    fn test_hash_verify_roundtrip() {
        let hasher = hasher();
        let digest = hasher.hash("correct horse battery staple").unwrap();
        assert!(hasher.verify("correct horse battery staple", &digest).unwrap());
        assert!(!hasher.verify("incorrect horse", &digest).unwrap());
    }

    #[test]
    fn test_digests_are_salted() {
        let hasher = hasher();
        let a = hasher.hash("same password").unwrap();
        let b = hasher.hash("same password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_digest_is_corrupt_credential() {
        let hasher = hasher();
        let result = hasher.verify("anything", "not-a-bcrypt-digest");
        assert!(matches!(result, Err(AuthError::CorruptCredential)));
    }

    #[test]
    fn test_invalid_cost_rejected() {
        assert!(matches!(
            PasswordHasher::new(3),
            Err(AuthError::Configuration(_))
        ));
        assert!(matches!(
            PasswordHasher::new(32),
            Err(AuthError::Configuration(_))
        ));
    }
}
