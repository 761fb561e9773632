//! # Error Types
//!
//! Domain-specific error types for tourbook-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tourbook-core errors (this file)                                      │
//! │  ├── PricingError        - Umbrella returned by the engine             │
//! │  ├── ConfigurationError  - Guide/platform misconfiguration (fatal)     │
//! │  ├── ValidationError     - Discount-code field violations at creation  │
//! │  └── RedemptionRejected  - Code refused at checkout, with a reason     │
//! │                                                                         │
//! │  tourbook-db errors (separate crate)                                   │
//! │  └── DbError             - Database operation failures                 │
//! │                                                                         │
//! │  Flow: ConfigurationError → PricingError → AppError → UI message       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field, value, code)
//! 3. Nothing is defaulted away: every misconfiguration surfaces here
//! 4. Rejections carry a machine-readable reason code

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Pricing Error
// =============================================================================

/// Umbrella error for every fallible engine operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// Settings or request cannot be priced as configured.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A discount-code write was rejected.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A discount code cannot be redeemed right now.
    #[error(transparent)]
    Redemption(#[from] RedemptionRejected),
}

// =============================================================================
// Configuration Error
// =============================================================================

/// Misconfiguration of a guide's policy or of the request itself.
///
/// ## When This Occurs
/// - A tier table has duplicate thresholds or a percent above 100
/// - A deposit percent outside 10-50, or a final payment over a year out
/// - A price so large the subtotal overflows
/// - A customer-choice booking without a (known) tier
/// - Any step that would produce a negative price or payment
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// A percent above 100.
    #[error("{field} percent {bps} bps is outside 0-100%")]
    PercentOutOfRange { field: String, bps: u32 },

    /// Two tiers in the same table share a threshold.
    #[error("{table} has duplicate threshold {threshold}")]
    DuplicateThreshold { table: String, threshold: i64 },

    /// A farther-out tier pays less than a closer one.
    #[error("{table} percents must not decrease as the threshold grows (at {threshold})")]
    NonMonotonicTiers { table: String, threshold: i64 },

    /// A day or hour threshold below zero.
    #[error("{table} threshold {value} must not be negative")]
    NegativeThreshold { table: String, value: i64 },

    /// Group tier bounds are inverted or below one participant.
    #[error("group tier {min_count}..{max_count:?} is not a valid participant range")]
    InvalidGroupRange { min_count: i64, max_count: Option<i64> },

    /// Two group tiers cover the same participant count.
    #[error("group tiers overlap at {count} participants")]
    OverlappingGroupTiers { count: i64 },

    /// Deposit percent outside the allowed window.
    #[error("deposit percent {bps} bps must be between {min}% and {max}%")]
    DepositPercentOutOfRange { bps: u32, min: u32, max: u32 },

    /// Final payment collected too far ahead of the tour.
    #[error("final payment {days} days before the tour exceeds the {max}-day limit")]
    FinalPaymentDaysOutOfRange { days: u32, max: u32 },

    /// A tier table that must not be empty is empty.
    #[error("{table} must define at least one tier")]
    EmptyTiers { table: String },

    /// A customer-choice tier name that does not exist.
    #[error("unknown customer-choice tier '{0}'")]
    UnknownChoiceTier(String),

    /// Customer-choice pricing needs the buyer's tier.
    #[error("customer-choice pricing requires a chosen tier")]
    MissingChoiceTier,

    /// A tier was chosen but the guide offers a single policy.
    #[error("tier '{0}' was chosen but the policy does not offer customer choice")]
    ChoiceNotOffered(String),

    /// An amount went below zero.
    #[error("{field} would be negative ({cents} cents)")]
    NegativeAmount { field: String, cents: i64 },

    /// An amount does not fit in 64-bit cents.
    #[error("{field} is too large to price")]
    AmountOverflow { field: String },

    /// A date falls outside the supported calendar range.
    #[error("{field} is outside the supported date range")]
    DateOutOfRange { field: String },

    /// Settings JSON could not be parsed.
    #[error("malformed settings: {0}")]
    Malformed(String),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Discount-code validation errors.
///
/// These occur when an admin or guide creates a code.
/// They reject the write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid characters, inverted window).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate code).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Redemption Rejected
// =============================================================================

/// Machine-readable reason a code was refused at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    /// No such code (or not valid for this guide).
    NotFound,
    /// Past `valid_until`.
    Expired,
    /// Usage cap reached.
    Exhausted,
    /// Switched off, or not live yet.
    Inactive,
    /// Purchase smaller than the code's minimum.
    BelowMinimum,
}

impl RejectionReason {
    /// Returns the wire code, e.g. `"EXHAUSTED"`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::NotFound => "NOT_FOUND",
            RejectionReason::Expired => "EXPIRED",
            RejectionReason::Exhausted => "EXHAUSTED",
            RejectionReason::Inactive => "INACTIVE",
            RejectionReason::BelowMinimum => "BELOW_MINIMUM",
        }
    }
}

/// A code cannot be redeemed.
///
/// ## User Workflow
/// ```text
/// Checkout: enter "SUMMER10"
///      │
///      ▼
/// RedemptionRejected { code: "SUMMER10", reason: Expired }
///      │
///      ▼
/// UI shows: "This code expired"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("discount code {code} rejected: {}", .reason.as_str())]
pub struct RedemptionRejected {
    pub code: String,
    pub reason: RejectionReason,
}

impl RedemptionRejected {
    pub fn new(code: impl Into<String>, reason: RejectionReason) -> Self {
        RedemptionRejected {
            code: code.into(),
            reason,
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with PricingError.
pub type PricingResult<T> = Result<T, PricingError>;

/// Result type for settings checks.
pub type ConfigResult<T> = Result<T, ConfigurationError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ConfigurationError::DepositPercentOutOfRange {
            bps: 6000,
            min: 10,
            max: 50,
        };
        assert_eq!(
            err.to_string(),
            "deposit percent 6000 bps must be between 10% and 50%"
        );
    }

    #[test]
    fn test_rejection_message_uses_reason_code() {
        let err = RedemptionRejected::new("SUMMER10", RejectionReason::BelowMinimum);
        assert_eq!(
            err.to_string(),
            "discount code SUMMER10 rejected: BELOW_MINIMUM"
        );
    }

    #[test]
    fn test_rejection_reason_serializes_screaming_snake() {
        let json = serde_json::to_string(&RejectionReason::NotFound).unwrap();
        assert_eq!(json, "\"NOT_FOUND\"");
    }

    #[test]
    fn test_validation_converts_to_pricing_error() {
        let validation_err = ValidationError::Required {
            field: "code".to_string(),
        };
        let err: PricingError = validation_err.into();
        assert!(matches!(err, PricingError::Validation(_)));
    }
}
