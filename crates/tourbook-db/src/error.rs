//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ├── RedeemError ← DbError or a RedemptionRejected                 │
//! │       ▼                                                                 │
//! │  AppError (pricing-preview) ← Machine-readable error code              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;
use tourbook_core::{ConfigurationError, RedemptionRejected, ValidationError};

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a code that already exists (after normalization)
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A stored row cannot be turned back into a domain value.
    #[error("Invalid stored record: {0}")]
    InvalidRecord(String),

    /// Stored or submitted policy settings are invalid.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Submitted discount code is invalid.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn invalid_record(message: impl Into<String>) -> Self {
        DbError::InvalidRecord(message.into())
    }

    /// Whether the error is a unique-constraint hit.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation { .. })
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // "UNIQUE constraint failed: <table>.<column>"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Redemption Error
// =============================================================================

/// Failure of a checkout redemption: either the code was refused or the
/// store could not be reached.
#[derive(Debug, Error)]
pub enum RedeemError {
    #[error(transparent)]
    Rejected(#[from] RedemptionRejected),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl RedeemError {
    /// The rejection, if the code itself was refused.
    pub fn rejection(&self) -> Option<&RedemptionRejected> {
        match self {
            RedeemError::Rejected(rejected) => Some(rejected),
            RedeemError::Db(_) => None,
        }
    }
}

impl From<sqlx::Error> for RedeemError {
    fn from(err: sqlx::Error) -> Self {
        RedeemError::Db(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourbook_core::RejectionReason;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[test]
    fn test_redeem_error_exposes_rejection() {
        let err: RedeemError =
            RedemptionRejected::new("SUMMER10", RejectionReason::Expired).into();
        assert_eq!(
            err.rejection().map(|r| r.reason),
            Some(RejectionReason::Expired)
        );

        let err: RedeemError = DbError::PoolExhausted.into();
        assert!(err.rejection().is_none());
    }
}
