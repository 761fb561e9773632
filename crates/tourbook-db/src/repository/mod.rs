//! # Repository Module
//!
//! Store traits the pricing flow talks to, and their SQLite implementations.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Pricing preview / checkout                                             │
//! │       │                                                                 │
//! │       │  policies().load_policy(guide_id)                               │
//! │       │  redeem(&codes, "SUMMER10", purchase, guide, now)               │
//! │       ▼                                                                 │
//! │  PolicyRepository          DiscountCodeStore       (traits)             │
//! │       │                         │                                       │
//! │       ▼                         ▼                                       │
//! │  SqlitePolicyRepository    DiscountCodeRepository  (SQLite)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`policy::SqlitePolicyRepository`] - Guide policy snapshots
//! - [`discount_code::DiscountCodeRepository`] - Codes and atomic redemption

pub mod discount_code;
pub mod policy;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tourbook_core::{DiscountCode, Money, NewDiscountCode, PolicySettings, RedeemOutcome};
use uuid::Uuid;

use crate::error::{DbResult, RedeemError};

/// Read/write access to guide policy settings.
#[async_trait]
pub trait PolicyRepository: Send + Sync {
    /// Loads and validates a guide's settings; `None` if the guide has none.
    async fn load_policy(&self, guide_id: Uuid) -> DbResult<Option<PolicySettings>>;

    /// Validates and stores a guide's settings, replacing any previous ones.
    async fn save_policy(&self, guide_id: Uuid, settings: &PolicySettings) -> DbResult<()>;
}

/// Discount-code storage.
#[async_trait]
pub trait DiscountCodeStore: Send + Sync {
    /// Looks a code up by its normalized form.
    async fn find_by_code(&self, code: &str) -> DbResult<Option<DiscountCode>>;

    /// Validates and inserts a new code.
    async fn insert(&self, new_code: NewDiscountCode) -> DbResult<DiscountCode>;

    /// Switches a code on or off.
    async fn set_active(&self, code: &str, active: bool) -> DbResult<()>;

    /// Increments `times_used` only if the code is redeemable right now,
    /// in one conditional statement.
    ///
    /// Returns `Ok(None)` when no row qualified; the caller re-reads the
    /// code to find out why.
    async fn redeem_if_available(
        &self,
        code: &str,
        purchase: Money,
        guide_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<Option<RedeemOutcome>, RedeemError>;
}
