//! PostgreSQL refresh token repository implementation
//!
//! Rotation is the only multi-statement operation: a conditional update
//! consumes the current token and the successor insert happens in the same
//! transaction, so concurrent rotations of one token have exactly one winner.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::RefreshTokenRow;
use crate::repo::{CreateRefreshToken, RefreshTokenRepository};

const SELECT_COLUMNS: &str =
    "id, user_id, chain_id, token_hash, issued_at, expires_at, revoked_at, replaced_by";

/// PostgreSQL refresh token repository
#[derive(Clone)]
pub struct PgRefreshTokenRepository {
    pool: PgPool,
}

impl PgRefreshTokenRepository {
    /// Create a new refresh token repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenRepository for PgRefreshTokenRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<RefreshTokenRow>> {
        let token = sqlx::query_as::<_, RefreshTokenRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM refresh_tokens WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> DbResult<Option<RefreshTokenRow>> {
        let token = sqlx::query_as::<_, RefreshTokenRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM refresh_tokens WHERE token_hash = $1"
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    async fn find_chain(&self, chain_id: Uuid) -> DbResult<Vec<RefreshTokenRow>> {
        let tokens = sqlx::query_as::<_, RefreshTokenRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM refresh_tokens WHERE chain_id = $1 ORDER BY issued_at"
        ))
        .bind(chain_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tokens)
    }

    async fn create(&self, token: CreateRefreshToken) -> DbResult<RefreshTokenRow> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(&format!(
            r#"
            INSERT INTO refresh_tokens (id, user_id, chain_id, token_hash, issued_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(token.id)
        .bind(token.user_id)
        .bind(token.chain_id)
        .bind(&token.token_hash)
        .bind(token.issued_at)
        .bind(token.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn rotate(
        &self,
        current_id: Uuid,
        revoked_at: DateTime<Utc>,
        successor: CreateRefreshToken,
    ) -> DbResult<Option<RefreshTokenRow>> {
        let mut tx = self.pool.begin().await?;

        // Compare-and-swap on revoked_at: only the first rotation attempt
        // sees an unrevoked row and gets to insert the successor.
        let consumed = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = $2, replaced_by = $3
            WHERE id = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(current_id)
        .bind(revoked_at)
        .bind(successor.id)
        .execute(&mut *tx)
        .await?;

        if consumed.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let row = sqlx::query_as::<_, RefreshTokenRow>(&format!(
            r#"
            INSERT INTO refresh_tokens (id, user_id, chain_id, token_hash, issued_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(successor.id)
        .bind(successor.user_id)
        .bind(successor.chain_id)
        .bind(&successor.token_hash)
        .bind(successor.issued_at)
        .bind(successor.expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(row))
    }

    async fn revoke(&self, id: Uuid, revoked_at: DateTime<Utc>) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = $2 WHERE id = $1 AND revoked_at IS NULL",
        )
        .bind(id)
        .bind(revoked_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke_chain(&self, chain_id: Uuid, revoked_at: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = $2 WHERE chain_id = $1 AND revoked_at IS NULL",
        )
        .bind(chain_id)
        .bind(revoked_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        revoked_at: DateTime<Utc>,
    ) -> DbResult<u64> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = $2 WHERE user_id = $1 AND revoked_at IS NULL",
        )
        .bind(user_id)
        .bind(revoked_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
