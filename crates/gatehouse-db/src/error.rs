//! Database errors

use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Record not found
    #[error("record not found")]
    NotFound,
}

impl DbError {
    /// Whether the error is a transient conflict worth retrying once
    /// (Postgres serialization failure 40001 or deadlock 40P01).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Sqlx(sqlx::Error::Database(db)) => {
                matches!(db.code().as_deref(), Some("40001") | Some("40P01"))
            }
            _ => false,
        }
    }
}

/// Result alias for database operations
pub type DbResult<T> = Result<T, DbError>;
