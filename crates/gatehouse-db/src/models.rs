//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// User row from the database
///
/// User records are read-only to the auth core; registration and account
/// management live in the surrounding services.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Refresh token row from the database
///
/// Only the SHA-256 hash of the opaque secret is stored; a leaked ledger
/// cannot be replayed. `chain_id` is the token ID of the chain root, so a
/// whole rotation chain can be revoked with one conditional update.
/// `replaced_by` records the successor for audit and reuse classification.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshTokenRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub chain_id: Uuid,
    pub token_hash: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub replaced_by: Option<Uuid>,
}

impl RefreshTokenRow {
    /// Check whether the token is still usable at `now`
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

// Conversion implementations from row types to gatehouse-types domain types
impl UserRow {
    /// Convert to domain UserId
    pub fn user_id(&self) -> gatehouse_types::UserId {
        gatehouse_types::UserId(self.id)
    }
}

impl RefreshTokenRow {
    /// Convert to domain RefreshTokenId
    pub fn token_id(&self) -> gatehouse_types::RefreshTokenId {
        gatehouse_types::RefreshTokenId(self.id)
    }

    /// Convert to domain UserId
    pub fn user_id(&self) -> gatehouse_types::UserId {
        gatehouse_types::UserId(self.user_id)
    }
}
