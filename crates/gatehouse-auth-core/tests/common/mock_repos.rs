//! In-memory mock repositories for testing
//!
//! The refresh token mock reproduces the storage contract the ledger
//! relies on: `rotate` is a compare-and-swap on `revoked_at` (the DashMap
//! entry lock serializes concurrent attempts), so exactly one caller wins.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use gatehouse_db::{
    CreateRefreshToken, DbResult, RefreshTokenRepository, RefreshTokenRow, UserRepository, UserRow,
};
use std::sync::Arc;
use uuid::Uuid;

/// In-memory user repository for testing
#[derive(Default, Clone)]
pub struct MockUserRepository {
    users: Arc<DashMap<Uuid, UserRow>>,
    by_email: Arc<DashMap<String, Uuid>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a test user directly
    pub fn insert_user(&self, user: UserRow) {
        self.by_email.insert(user.email.clone(), user.id);
        self.users.insert(user.id, user);
    }

    /// Build a user row with the given email and bcrypt digest
    pub fn test_user(email: &str, password_hash: String) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash,
            role: "user".to_string(),
            active: true,
            created_at: Utc::now(),
        }
    }

    /// Flip the active flag on a stored user
    #[allow(dead_code)]
    pub fn set_active(&self, id: Uuid, active: bool) {
        if let Some(mut user) = self.users.get_mut(&id) {
            user.active = active;
        }
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>> {
        Ok(self.users.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        Ok(self
            .by_email
            .get(email)
            .and_then(|id| self.users.get(id.value()).map(|r| r.value().clone())))
    }
}

/// In-memory refresh token repository for testing
#[derive(Default, Clone)]
pub struct MockRefreshTokenRepository {
    tokens: Arc<DashMap<Uuid, RefreshTokenRow>>,
    by_hash: Arc<DashMap<String, Uuid>>,
}

impl MockRefreshTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert_row(&self, create: CreateRefreshToken) -> RefreshTokenRow {
        let row = RefreshTokenRow {
            id: create.id,
            user_id: create.user_id,
            chain_id: create.chain_id,
            token_hash: create.token_hash.clone(),
            issued_at: create.issued_at,
            expires_at: create.expires_at,
            revoked_at: None,
            replaced_by: None,
        };
        self.by_hash.insert(create.token_hash, create.id);
        self.tokens.insert(create.id, row.clone());
        row
    }
}

#[async_trait]
impl RefreshTokenRepository for MockRefreshTokenRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<RefreshTokenRow>> {
        Ok(self.tokens.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> DbResult<Option<RefreshTokenRow>> {
        Ok(self
            .by_hash
            .get(token_hash)
            .and_then(|id| self.tokens.get(id.value()).map(|r| r.value().clone())))
    }

    async fn find_chain(&self, chain_id: Uuid) -> DbResult<Vec<RefreshTokenRow>> {
        let mut rows: Vec<RefreshTokenRow> = self
            .tokens
            .iter()
            .filter(|r| r.value().chain_id == chain_id)
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by_key(|r| r.issued_at);
        Ok(rows)
    }

    async fn create(&self, token: CreateRefreshToken) -> DbResult<RefreshTokenRow> {
        Ok(self.insert_row(token))
    }

    async fn rotate(
        &self,
        current_id: Uuid,
        revoked_at: DateTime<Utc>,
        successor: CreateRefreshToken,
    ) -> DbResult<Option<RefreshTokenRow>> {
        // The entry guard makes the revoked_at check-and-set atomic.
        let won = match self.tokens.get_mut(&current_id) {
            Some(mut row) if row.revoked_at.is_none() => {
                row.revoked_at = Some(revoked_at);
                row.replaced_by = Some(successor.id);
                true
            }
            _ => false,
        };
        if !won {
            return Ok(None);
        }
        Ok(Some(self.insert_row(successor)))
    }

    async fn revoke(&self, id: Uuid, revoked_at: DateTime<Utc>) -> DbResult<bool> {
        Ok(match self.tokens.get_mut(&id) {
            Some(mut row) if row.revoked_at.is_none() => {
                row.revoked_at = Some(revoked_at);
                true
            }
            _ => false,
        })
    }

    async fn revoke_chain(&self, chain_id: Uuid, revoked_at: DateTime<Utc>) -> DbResult<u64> {
        let mut count = 0;
        for mut row in self.tokens.iter_mut() {
            if row.chain_id == chain_id && row.revoked_at.is_none() {
                row.revoked_at = Some(revoked_at);
                count += 1;
            }
        }
        Ok(count)
    }

    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        revoked_at: DateTime<Utc>,
    ) -> DbResult<u64> {
        let mut count = 0;
        for mut row in self.tokens.iter_mut() {
            if row.user_id == user_id && row.revoked_at.is_none() {
                row.revoked_at = Some(revoked_at);
                count += 1;
            }
        }
        Ok(count)
    }
}
