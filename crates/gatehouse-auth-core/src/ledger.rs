//! Refresh token ledger
//!
//! Durable record of issued refresh tokens plus the rotation and
//! revocation state machine. Per chain link: Active -> Rotated (points to
//! its successor), Active -> Revoked (logout), or Active -> Expired
//! (passive). Presenting a Rotated or Revoked token again revokes the
//! entire chain.
//!
//! The repository's `rotate` is a single-transaction conditional write, so
//! concurrent rotations of the same token have exactly one winner. A loser
//! inside `rotation_race_window` of the winning write observes
//! `ConcurrentRotation`; outside it, the presentation is treated as reuse.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use gatehouse_db::{CreateRefreshToken, RefreshTokenRepository, RefreshTokenRow};
use gatehouse_types::UserId;
use uuid::Uuid;

use crate::crypto::{constant_time_eq, generate_refresh_secret, hash_token};
use crate::{AuthError, Clock};

/// A freshly issued refresh token: the ledger record plus the opaque
/// secret handed to the caller. The secret exists only here; storage keeps
/// its hash.
#[derive(Debug)]
pub struct IssuedRefreshToken {
    pub record: RefreshTokenRow,
    pub secret: String,
}

/// Refresh token ledger
pub struct RefreshTokenLedger<R: RefreshTokenRepository> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
    ttl: ChronoDuration,
    race_window: ChronoDuration,
}

impl<R: RefreshTokenRepository> RefreshTokenLedger<R> {
    /// Create a ledger over a token repository.
    pub fn new(
        repo: Arc<R>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
        race_window: Duration,
    ) -> Result<Self, AuthError> {
        let ttl = ChronoDuration::from_std(ttl)
            .map_err(|_| AuthError::Configuration("refresh token ttl out of range".to_string()))?;
        let race_window = ChronoDuration::from_std(race_window).map_err(|_| {
            AuthError::Configuration("rotation race window out of range".to_string())
        })?;
        Ok(Self {
            repo,
            clock,
            ttl,
            race_window,
        })
    }

    /// Issue a fresh refresh token, starting a new rotation chain.
    pub async fn issue(&self, user_id: UserId) -> Result<IssuedRefreshToken, AuthError> {
        let now = self.clock.now();
        let secret = generate_refresh_secret();
        let id = Uuid::new_v4();
        let create = CreateRefreshToken {
            id,
            user_id: user_id.0,
            // a fresh token roots its own chain
            chain_id: id,
            token_hash: hash_token(&secret),
            issued_at: now,
            expires_at: now + self.ttl,
        };
        let record = self.repo.create(create).await?;
        Ok(IssuedRefreshToken { record, secret })
    }

    /// Consume `presented` and issue its successor.
    ///
    /// Fails with `UnknownToken`, `Expired` (no ledger mutation),
    /// `ConcurrentRotation` (lost a same-burst race), or
    /// `TokenReuseDetected` (chain revoked as containment).
    pub async fn rotate(&self, presented: &str) -> Result<IssuedRefreshToken, AuthError> {
        let presented_hash = hash_token(presented);
        let current = self
            .repo
            .find_by_token_hash(&presented_hash)
            .await?
            .ok_or(AuthError::UnknownToken)?;

        // The index already matched; re-check the stored hash in constant
        // time as defense in depth against lookup shortcuts.
        if !constant_time_eq(current.token_hash.as_bytes(), presented_hash.as_bytes()) {
            return Err(AuthError::UnknownToken);
        }

        let now = self.clock.now();
        if let Some(revoked_at) = current.revoked_at {
            return Err(self.consumed_token_fault(&current, revoked_at, now).await);
        }
        if current.expires_at <= now {
            return Err(AuthError::Expired);
        }

        let secret = generate_refresh_secret();
        let successor = CreateRefreshToken {
            id: Uuid::new_v4(),
            user_id: current.user_id,
            chain_id: current.chain_id,
            token_hash: hash_token(&secret),
            issued_at: now,
            expires_at: now + self.ttl,
        };

        let rotated = match self.repo.rotate(current.id, now, successor.clone()).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_transient() => {
                tracing::debug!("transient storage conflict during rotation, retrying once");
                self.repo.rotate(current.id, now, successor).await?
            }
            Err(e) => return Err(e.into()),
        };

        match rotated {
            Some(record) => Ok(IssuedRefreshToken { record, secret }),
            None => {
                // Lost the compare-and-swap. Re-read to classify: a burst
                // race or a genuine reuse of a consumed token.
                let observed = self
                    .repo
                    .find_by_id(current.id)
                    .await?
                    .ok_or(AuthError::UnknownToken)?;
                let revoked_at = observed.revoked_at.unwrap_or(now);
                Err(self.consumed_token_fault(&observed, revoked_at, now).await)
            }
        }
    }

    /// Revoke a single token with no replacement (logout).
    ///
    /// Idempotent: revoking an already-revoked or unknown token is not an
    /// error.
    pub async fn revoke(&self, presented: &str) -> Result<(), AuthError> {
        let hash = hash_token(presented);
        let Some(record) = self.repo.find_by_token_hash(&hash).await? else {
            tracing::debug!("logout for unknown refresh token ignored");
            return Ok(());
        };
        let freshly_revoked = self.repo.revoke(record.id, self.clock.now()).await?;
        if !freshly_revoked {
            tracing::debug!(token = %record.id, "refresh token was already revoked");
        }
        Ok(())
    }

    /// Revoke every active token a user holds (global logout, compromise
    /// response). Returns the number of tokens revoked.
    pub async fn revoke_all_for_user(&self, user_id: UserId) -> Result<u64, AuthError> {
        let count = self
            .repo
            .revoke_all_for_user(user_id.0, self.clock.now())
            .await?;
        tracing::info!(user = %user_id, revoked = count, "revoked all refresh tokens for user");
        Ok(count)
    }

    /// Fetch a rotation chain for audit, oldest first.
    pub async fn chain(&self, chain_id: Uuid) -> Result<Vec<RefreshTokenRow>, AuthError> {
        Ok(self.repo.find_chain(chain_id).await?)
    }

    /// Classify a presentation of an already-consumed token.
    ///
    /// A token rotated (`replaced_by` set) within the race window is a
    /// concurrent-rotation loser from the same request burst. Anything
    /// else is a reuse event: revoke the whole chain to contain a stolen
    /// token.
    async fn consumed_token_fault(
        &self,
        record: &RefreshTokenRow,
        revoked_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AuthError {
        if record.replaced_by.is_some() && now - revoked_at <= self.race_window {
            tracing::debug!(token = %record.id, "lost rotation race inside the burst window");
            return AuthError::ConcurrentRotation;
        }

        tracing::warn!(
            token = %record.id,
            chain = %record.chain_id,
            "refresh token reuse detected, revoking chain"
        );
        match self.repo.revoke_chain(record.chain_id, now).await {
            Ok(count) => {
                tracing::warn!(chain = %record.chain_id, revoked = count, "chain revoked");
                AuthError::TokenReuseDetected
            }
            Err(e) => e.into(),
        }
    }
}

impl<R: RefreshTokenRepository> std::fmt::Debug for RefreshTokenLedger<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshTokenLedger")
            .field("ttl", &self.ttl)
            .field("race_window", &self.race_window)
            .finish_non_exhaustive()
    }
}
