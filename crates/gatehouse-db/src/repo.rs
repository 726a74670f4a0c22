//! Repository traits
//!
//! Define async repository interfaces for database operations. Revocation
//! timestamps are supplied by the caller rather than read from the database
//! clock, so the auth core stays deterministic under an injected clock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::*;

/// User repository trait
///
/// The auth core never mutates user records, so this interface is read-only.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>>;

    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>>;
}

/// Refresh token repository trait
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// Find a refresh token by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<RefreshTokenRow>>;

    /// Find a refresh token by the hash of its opaque secret
    async fn find_by_token_hash(&self, token_hash: &str) -> DbResult<Option<RefreshTokenRow>>;

    /// Find all tokens in a rotation chain, oldest first
    async fn find_chain(&self, chain_id: Uuid) -> DbResult<Vec<RefreshTokenRow>>;

    /// Insert a new active refresh token
    async fn create(&self, token: CreateRefreshToken) -> DbResult<RefreshTokenRow>;

    /// Atomically consume `current_id` and insert its successor.
    ///
    /// The consume step is a conditional write (`revoked_at IS NULL`), and
    /// both steps run in a single transaction. Returns the successor row,
    /// or `None` when another caller already consumed the token: exactly
    /// one of any number of concurrent callers wins.
    async fn rotate(
        &self,
        current_id: Uuid,
        revoked_at: DateTime<Utc>,
        successor: CreateRefreshToken,
    ) -> DbResult<Option<RefreshTokenRow>>;

    /// Revoke a single token with no replacement (logout).
    ///
    /// Returns `true` if the token was active and is now revoked, `false`
    /// if it was already revoked (idempotent).
    async fn revoke(&self, id: Uuid, revoked_at: DateTime<Utc>) -> DbResult<bool>;

    /// Revoke every not-yet-revoked token in a chain. Returns the count.
    async fn revoke_chain(&self, chain_id: Uuid, revoked_at: DateTime<Utc>) -> DbResult<u64>;

    /// Revoke every not-yet-revoked token for a user. Returns the count.
    async fn revoke_all_for_user(&self, user_id: Uuid, revoked_at: DateTime<Utc>)
        -> DbResult<u64>;
}

/// Create refresh token input
#[derive(Debug, Clone)]
pub struct CreateRefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub chain_id: Uuid,
    pub token_hash: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
