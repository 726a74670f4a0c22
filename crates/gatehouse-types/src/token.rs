//! Token claims and token-pair types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Role, UserId};

/// Unique refresh-token identifier (ledger primary key, not the opaque secret)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefreshTokenId(pub Uuid);

impl RefreshTokenId {
    /// Create a new random refresh-token ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a refresh-token ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for RefreshTokenId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RefreshTokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RefreshTokenId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Token type marker carried in the `typ` claim
pub const TOKEN_TYPE_ACCESS: &str = "access";

/// Claims carried by a signed access token
///
/// Access tokens are stateless: validity is determined solely by the
/// signature and the `iat`/`exp` window. The `jti` exists so an explicit
/// logout can deny the token for its remaining lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user ID)
    pub sub: UserId,
    /// User role at issuance time
    pub role: Role,
    /// Issued-at timestamp (seconds)
    pub iat: i64,
    /// Expiration timestamp (seconds)
    pub exp: i64,
    /// Unique token ID
    pub jti: Uuid,
    /// Token type, always "access"
    pub typ: String,
}

impl AccessClaims {
    /// Check whether the claims are expired at `now` (no skew tolerance)
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.exp
    }
}

/// Token pair returned after login or refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access token (short-lived, signed JWT)
    pub access_token: String,
    /// Refresh token (long-lived, opaque secret)
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: u64,
    /// Token type (always "Bearer")
    pub token_type: String,
}

impl TokenPair {
    /// Build a pair with the standard bearer token type
    pub fn bearer(access_token: String, refresh_token: String, expires_in: u64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_in,
            token_type: "Bearer".to_string(),
        }
    }
}
