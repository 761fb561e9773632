//! # tourbook-core: Pure Pricing Engine for Tourbook
//!
//! This crate is the **heart** of the Tourbook booking flow. It turns a
//! guide's policy settings and a booking request into a priced, deposit-split
//! breakdown, with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tourbook Pricing Flow                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          Checkout UI / Admin Pricing Preview                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ PricingRequest                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ tourbook-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   tier ──► discount ──┐                                        │   │
//! │  │   tier ──► cancellation ──► calculator ──► PricingBreakdown    │   │
//! │  │            deposit ───┘         ▲                               │   │
//! │  │            code ────────────────┘                               │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              tourbook-db (Persistence Layer)                    │   │
//! │  │        policy store, code store, atomic redemption              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic and bankers rounding
//! - [`percent`] - Percent type in basis points
//! - [`tier`] - Generic threshold-tier resolution
//! - [`settings`] - Guide policy settings and boundary validation
//! - [`discount`] - Early-bird, group and last-minute stacking with the cap
//! - [`cancellation`] - Refund percent resolution and customer-choice tiers
//! - [`deposit`] - Deposit / final-payment split
//! - [`code`] - Discount-code validation and redemption rules
//! - [`calculator`] - Orchestrator producing [`PricingBreakdown`]
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use tourbook_core::{calculate, LeadTime, Money, PolicySettings, PricingRequest};
//!
//! let booked_at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
//! let request = PricingRequest {
//!     base_price_per_person: Money::from_major_minor(250, 0),
//!     participant_count: 4,
//!     booked_at,
//!     tour_start: booked_at + Duration::days(45),
//!     choice: None,
//!     guide_id: None,
//!     discount_code: None,
//! };
//!
//! let breakdown = calculate(&request, &PolicySettings::default()).unwrap();
//! assert_eq!(breakdown.final_price, Money::from_major_minor(830, 0));
//! assert_eq!(breakdown.deposit_amount, Money::from_major_minor(249, 0));
//! # let _ = LeadTime::from_days(45);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod calculator;
pub mod cancellation;
pub mod code;
pub mod deposit;
pub mod discount;
pub mod error;
pub mod money;
pub mod percent;
pub mod settings;
pub mod tier;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use calculator::{calculate, PricingBreakdown, PricingRequest};
pub use cancellation::{refund_amount, resolve_refund_percent, ChoiceTier};
pub use code::{
    CodeScope, CodeStatus, DiscountCode, DiscountType, DiscountValue, NewDiscountCode,
    RedeemOutcome,
};
pub use deposit::{schedule, DepositSchedule};
pub use discount::{apply_discounts, LeadTime, StackedDiscount};
pub use error::{
    ConfigurationError, PricingError, PricingResult, RejectionReason, RedemptionRejected,
    ValidationError,
};
pub use money::Money;
pub use percent::Percent;
pub use settings::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum combined percentage that automatic discounts may take off.
///
/// Applied to the SUM of early-bird, group and last-minute percents.
/// Discount codes are not subject to it.
pub const STACKING_CAP: Percent = Percent::from_whole(40);

/// Lowest deposit a guide may configure, in whole percent.
pub const DEPOSIT_MIN_PERCENT: u32 = 10;

/// Highest deposit a guide may configure, in whole percent.
pub const DEPOSIT_MAX_PERCENT: u32 = 50;

/// Furthest ahead of the tour a final payment may be collected, in days.
pub const MAX_FINAL_PAYMENT_DAYS_BEFORE: u32 = 365;

/// Minimum length of a discount code after normalization.
pub const MIN_CODE_LENGTH: usize = 3;

/// Maximum length of a discount code after normalization.
pub const MAX_CODE_LENGTH: usize = 32;
