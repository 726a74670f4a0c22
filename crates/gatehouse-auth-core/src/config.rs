//! Configuration types for the auth core

use std::time::Duration;

/// Auth core configuration
///
/// An explicit struct passed into constructors; there is no global settings
/// singleton anywhere in this crate.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Access token lifetime
    pub access_token_ttl: Duration,
    /// Refresh token lifetime
    pub refresh_token_ttl: Duration,
    /// Clock skew tolerated when checking `exp` and `iat`
    pub clock_skew_tolerance: Duration,
    /// How long a retired signing key keeps verifying tokens
    pub key_rotation_grace: Duration,
    /// Window inside which a lost rotation race counts as a concurrent
    /// rotation rather than token reuse
    pub rotation_race_window: Duration,
    /// bcrypt cost factor for password hashing
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_ttl: Duration::from_secs(15 * 60),
            refresh_token_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            clock_skew_tolerance: Duration::from_secs(30),
            key_rotation_grace: Duration::from_secs(24 * 60 * 60),
            rotation_race_window: Duration::from_secs(5),
            bcrypt_cost: 10,
        }
    }
}

impl AuthConfig {
    /// Create a config with the default durations
    pub fn new() -> Self {
        Self::default()
    }

    /// Set access token lifetime
    pub fn with_access_token_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_ttl = ttl;
        self
    }

    /// Set refresh token lifetime
    pub fn with_refresh_token_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_token_ttl = ttl;
        self
    }

    /// Set clock skew tolerance
    pub fn with_clock_skew_tolerance(mut self, tolerance: Duration) -> Self {
        self.clock_skew_tolerance = tolerance;
        self
    }

    /// Set signing key rotation grace window
    pub fn with_key_rotation_grace(mut self, grace: Duration) -> Self {
        self.key_rotation_grace = grace;
        self
    }

    /// Set the concurrent-rotation race window
    pub fn with_rotation_race_window(mut self, window: Duration) -> Self {
        self.rotation_race_window = window;
        self
    }

    /// Set bcrypt cost factor
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }
}
