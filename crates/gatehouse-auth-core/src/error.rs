//! Auth errors

use thiserror::Error;

/// Authentication errors
///
/// `AuthFailed` is deliberately generic: callers can never distinguish a
/// wrong password from an unknown email or a disabled account.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Bad credentials (wrong password, unknown email, disabled account)
    #[error("authentication failed")]
    AuthFailed,

    /// Access token signature does not verify against any live key
    #[error("bad signature")]
    BadSignature,

    /// Token has expired (beyond skew tolerance)
    #[error("token expired")]
    Expired,

    /// Token issued-at lies in the future (beyond skew tolerance)
    #[error("token not yet valid")]
    NotYetValid,

    /// Token cannot be parsed or carries the wrong shape
    #[error("malformed token")]
    MalformedToken,

    /// Presented refresh token has no ledger record
    #[error("unknown refresh token")]
    UnknownToken,

    /// An already-consumed refresh token was presented again; the whole
    /// chain has been revoked
    #[error("refresh token reuse detected")]
    TokenReuseDetected,

    /// Lost a same-burst race to rotate the same token (not a security event)
    #[error("concurrent rotation conflict")]
    ConcurrentRotation,

    /// Stored credential digest cannot be parsed (storage corruption)
    #[error("corrupt stored credential")]
    CorruptCredential,

    /// Generic authorization failure surfaced at the service boundary
    #[error("unauthorized")]
    Unauthorized,

    /// Configuration error (bad key material, invalid cost factor)
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::AuthFailed
            | Self::BadSignature
            | Self::Expired
            | Self::NotYetValid
            | Self::MalformedToken
            | Self::UnknownToken
            | Self::TokenReuseDetected
            | Self::Unauthorized => 401,
            Self::ConcurrentRotation => 409,
            Self::CorruptCredential
            | Self::Configuration(_)
            | Self::Database(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AuthFailed => "AUTH_FAILED",
            Self::BadSignature => "BAD_SIGNATURE",
            Self::Expired => "EXPIRED",
            Self::NotYetValid => "NOT_YET_VALID",
            Self::MalformedToken => "MALFORMED_TOKEN",
            Self::UnknownToken => "UNKNOWN_TOKEN",
            Self::TokenReuseDetected => "TOKEN_REUSE_DETECTED",
            Self::ConcurrentRotation => "CONCURRENT_ROTATION",
            Self::CorruptCredential => "CORRUPT_CREDENTIAL",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the surrounding system should log a security event and
    /// force full re-authentication for the affected user.
    pub fn is_security_event(&self) -> bool {
        matches!(self, Self::TokenReuseDetected)
    }
}

impl From<gatehouse_db::DbError> for AuthError {
    fn from(err: gatehouse_db::DbError) -> Self {
        tracing::error!("database error: {}", err);
        Self::Database(err.to_string())
    }
}
