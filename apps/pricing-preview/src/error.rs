//! # Application Error Type
//!
//! Unified error type for the preview app.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Preview                            │
//! │                                                                         │
//! │  DbError ──────────────┐                                               │
//! │  RedeemError ──────────┤                                               │
//! │  PricingError ─────────┼──► AppError { code, message, reason? }        │
//! │  std::io::Error ───────┘            │                                   │
//! │                                     ▼                                   │
//! │                      stderr: {"code":"CODE_REJECTED",...}               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;
use tourbook_core::{PricingError, RedemptionRejected, RejectionReason, ValidationError};
use tourbook_db::{DbError, RedeemError};

/// Error reported by a preview run.
///
/// ## Serialization
/// ```json
/// {
///   "code": "CODE_REJECTED",
///   "message": "discount code LAST1 rejected: EXHAUSTED",
///   "reason": "EXHAUSTED"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct AppError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Why a discount code was refused, for `CODE_REJECTED`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectionReason>,
}

/// Error codes for preview failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found
    NotFound,

    /// Submitted data failed validation
    ValidationError,

    /// Guide policy or request cannot be priced
    ConfigurationError,

    /// Discount code refused at checkout
    CodeRejected,

    /// Database operation failed
    DatabaseError,

    /// Internal error
    Internal,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError {
            code,
            message: message.into(),
            reason: None,
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        AppError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::Internal, message)
    }

    /// Serializes the error for stderr, falling back to the bare message.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.message.clone())
    }
}

impl From<RedemptionRejected> for AppError {
    fn from(err: RedemptionRejected) -> Self {
        AppError {
            code: ErrorCode::CodeRejected,
            message: err.to_string(),
            reason: Some(err.reason),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::new(ErrorCode::ValidationError, err.to_string())
    }
}

impl From<PricingError> for AppError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::Configuration(e) => {
                AppError::new(ErrorCode::ConfigurationError, e.to_string())
            }
            PricingError::Validation(e) => e.into(),
            PricingError::Redemption(e) => e.into(),
        }
    }
}

/// Converts database errors, hiding raw SQL failures behind a generic message.
impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => AppError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => AppError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::Configuration(e) => AppError::new(ErrorCode::ConfigurationError, e.to_string()),
            DbError::Validation(e) => e.into(),
            DbError::ConnectionFailed(_) => {
                AppError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                AppError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::PoolExhausted => {
                AppError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::InvalidRecord(e) => {
                tracing::error!("Invalid stored record: {}", e);
                AppError::new(ErrorCode::DatabaseError, "Stored record is invalid")
            }
            DbError::QueryFailed(e) | DbError::Internal(e) => {
                tracing::error!("Database operation failed: {}", e);
                AppError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<RedeemError> for AppError {
    fn from(err: RedeemError) -> Self {
        match err {
            RedeemError::Rejected(e) => e.into(),
            RedeemError::Db(e) => e.into(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::internal(format!("I/O error: {}", err))
    }
}

pub type AppResult<T> = Result<T, AppError>;
