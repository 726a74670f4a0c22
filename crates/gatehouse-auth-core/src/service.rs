//! Auth service - ties together password verification, the token codec,
//! and the refresh token ledger
//!
//! This is the caller-facing surface consumed by the HTTP layer: `login`,
//! `refresh`, `logout`, `revoke_all_for_user`, and `authenticate`.

use std::sync::Arc;

use gatehouse_db::{RefreshTokenRepository, UserRepository, UserRow};
use gatehouse_types::{AccessClaims, Role, TokenPair, UserId};

use crate::{
    AccessDenylist, AuthConfig, AuthError, Clock, Keyring, PasswordHasher, RefreshTokenLedger,
    SigningKey, SystemClock, TokenCodec,
};

/// Authentication service
///
/// Orchestrates login, refresh, and logout. Credential failures collapse
/// to a generic `AuthFailed`; `TokenReuseDetected` always reaches the
/// caller so the surrounding system can force re-authentication and alert.
pub struct AuthService<U: UserRepository, R: RefreshTokenRepository> {
    config: AuthConfig,
    hasher: PasswordHasher,
    codec: TokenCodec,
    ledger: RefreshTokenLedger<R>,
    denylist: AccessDenylist,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
}

impl<U: UserRepository, R: RefreshTokenRepository> AuthService<U, R> {
    /// Create an auth service over the system clock
    pub fn new(
        config: AuthConfig,
        keyring: Keyring,
        users: Arc<U>,
        tokens: Arc<R>,
    ) -> Result<Self, AuthError> {
        Self::with_clock(config, keyring, users, tokens, Arc::new(SystemClock))
    }

    /// Create an auth service with an injected clock (deterministic tests)
    pub fn with_clock(
        config: AuthConfig,
        keyring: Keyring,
        users: Arc<U>,
        tokens: Arc<R>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AuthError> {
        let hasher = PasswordHasher::new(config.bcrypt_cost)?;
        let codec = TokenCodec::new(
            keyring,
            Arc::clone(&clock),
            config.clock_skew_tolerance,
            config.key_rotation_grace,
        );
        let ledger = RefreshTokenLedger::new(
            tokens,
            Arc::clone(&clock),
            config.refresh_token_ttl,
            config.rotation_race_window,
        )?;
        Ok(Self {
            config,
            hasher,
            codec,
            ledger,
            denylist: AccessDenylist::new(),
            users,
            clock,
        })
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Verify credentials and issue a token pair.
    ///
    /// Unknown email, wrong password, and disabled account all return the
    /// same `AuthFailed`, and the unknown-email path burns a bcrypt
    /// verification so the two are indistinguishable by timing.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            self.hasher.burn(password);
            tracing::debug!("login rejected: unknown email");
            return Err(AuthError::AuthFailed);
        };
        if !self.hasher.verify(password, &user.password_hash)? {
            tracing::debug!(user = %user.id, "login rejected: wrong password");
            return Err(AuthError::AuthFailed);
        }
        if !user.active {
            tracing::debug!(user = %user.id, "login rejected: account disabled");
            return Err(AuthError::AuthFailed);
        }
        self.issue_pair(&user).await
    }

    /// Exchange a refresh token for a new token pair, consuming it.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let rotated = self
            .ledger
            .rotate(refresh_token)
            .await
            .map_err(map_rotation_error)?;

        let user = self
            .users
            .find_by_id(rotated.record.user_id)
            .await?
            .ok_or(AuthError::Unauthorized)?;
        if !user.active {
            tracing::debug!(user = %user.id, "refresh rejected: account disabled");
            return Err(AuthError::Unauthorized);
        }

        let (access_token, _) = self.codec.issue(
            user.user_id(),
            user_role(&user),
            self.config.access_token_ttl,
        )?;
        Ok(TokenPair::bearer(
            access_token,
            rotated.secret,
            self.config.access_token_ttl.as_secs(),
        ))
    }

    /// Revoke a refresh token; idempotent. When the matching access token
    /// is presented too, its jti is denied for its remaining lifetime.
    pub async fn logout(
        &self,
        refresh_token: &str,
        access_token: Option<&str>,
    ) -> Result<(), AuthError> {
        self.ledger.revoke(refresh_token).await?;

        if let Some(token) = access_token {
            match self.codec.peek(token) {
                Ok(claims) => self.denylist.insert(claims.jti, claims.exp, self.clock.now()),
                Err(e) => {
                    tracing::debug!("ignoring unverifiable access token at logout: {}", e);
                }
            }
        }
        Ok(())
    }

    /// Revoke every refresh token a user holds (global logout, compromise
    /// response). Returns the number of tokens revoked.
    pub async fn revoke_all_for_user(&self, user_id: UserId) -> Result<u64, AuthError> {
        self.ledger.revoke_all_for_user(user_id).await
    }

    // =========================================================================
    // Access tokens
    // =========================================================================

    /// Validate an access token for request handling: signature, time
    /// window, and the logout denylist.
    pub fn authenticate(&self, access_token: &str) -> Result<AccessClaims, AuthError> {
        let claims = self.codec.verify(access_token)?;
        if self.denylist.contains(&claims.jti, self.clock.now()) {
            tracing::debug!(jti = %claims.jti, "access token denied after logout");
            return Err(AuthError::Unauthorized);
        }
        Ok(claims)
    }

    /// Install a new signing key; old tokens keep verifying inside the
    /// rotation grace window.
    pub fn rotate_signing_key(&self, next: SigningKey) {
        self.codec.rotate_keys(next);
    }

    /// The underlying ledger, for chain audit
    pub fn ledger(&self) -> &RefreshTokenLedger<R> {
        &self.ledger
    }

    async fn issue_pair(&self, user: &UserRow) -> Result<TokenPair, AuthError> {
        // Refresh token first: if the caller disconnects mid-call the
        // ledger record stays valid, which is the intended outcome.
        let refresh = self.ledger.issue(user.user_id()).await?;
        let (access_token, _) = self.codec.issue(
            user.user_id(),
            user_role(user),
            self.config.access_token_ttl,
        )?;
        Ok(TokenPair::bearer(
            access_token,
            refresh.secret,
            self.config.access_token_ttl.as_secs(),
        ))
    }
}

/// An unrecognized role string falls back to the least-privileged role.
fn user_role(user: &UserRow) -> Role {
    user.role.parse().unwrap_or(Role::User)
}

/// Boundary mapping: ordinary rotation failures collapse to a generic
/// `Unauthorized`; `TokenReuseDetected` and `ConcurrentRotation` stay
/// distinct because callers react to them differently.
fn map_rotation_error(e: AuthError) -> AuthError {
    match e {
        AuthError::UnknownToken | AuthError::Expired => AuthError::Unauthorized,
        other => other,
    }
}

impl<U: UserRepository, R: RefreshTokenRepository> std::fmt::Debug for AuthService<U, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
