//! Database error types.

use serde_json::Value;
use thiserror::Error;

/// The offending key/value pair of a uniqueness violation.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateKey {
    pub key: String,
    pub value: Value,
}

/// Store operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Failed to connect to the database.
    #[error("failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    /// Failed to execute a query.
    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),

    /// Failed to run migrations.
    #[error("migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),

    /// Migration directory not found in the current environment.
    #[error("migration directory not found; tried {tried}. Last error: {last_error}. Run from repo root or services/pokedex.")]
    MigrationDirNotFound { tried: String, last_error: String },

    /// A write would duplicate a value in a unique field.
    #[error("duplicate key: {}={}", .0.key, .0.value)]
    UniqueViolation(DuplicateKey),

    /// A stored row could not be decoded into a record.
    #[error("invalid row: {0}")]
    InvalidRow(String),
}

impl DbError {
    /// Returns true if this error is the store's uniqueness-violation signal.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation(_))
    }

    /// Returns the offending key/value of a uniqueness violation.
    pub fn duplicate_key(&self) -> Option<&DuplicateKey> {
        match self {
            DbError::UniqueViolation(duplicate) => Some(duplicate),
            _ => None,
        }
    }

    pub(crate) fn unique(key: impl Into<String>, value: impl Into<Value>) -> Self {
        DbError::UniqueViolation(DuplicateKey {
            key: key.into(),
            value: value.into(),
        })
    }
}
