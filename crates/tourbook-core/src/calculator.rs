//! # Pricing Calculator
//!
//! Orchestrates the pricing pipeline for one booking.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PricingRequest + PolicySettings                                        │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  1. validate settings                                                   │
//! │  2. customer-choice adjustment     250.00 × (1 ± 10%)                   │
//! │  3. stacked discounts (≤ 40%)      early-bird + group + last-minute     │
//! │  4. discount code on post-cap price                                     │
//! │  5. deposit split                  deposit + final payment = final      │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  PricingBreakdown                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The calculator reads nothing but its arguments: pricing the same request
//! twice yields identical breakdowns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;
use uuid::Uuid;

use crate::cancellation::{resolve_refund_percent, ChoiceTier};
use crate::code::DiscountCode;
use crate::deposit::schedule;
use crate::discount::{apply_discounts, LeadTime};
use crate::error::{ConfigurationError, PricingResult};
use crate::money::Money;
use crate::percent::Percent;
use crate::settings::{CancellationPolicy, PolicySettings};

// =============================================================================
// Request
// =============================================================================

/// One booking to price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricingRequest {
    pub base_price_per_person: Money,
    pub participant_count: u32,

    /// Instant of booking; also the "now" used for code checks.
    #[ts(as = "String")]
    pub booked_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub tour_start: DateTime<Utc>,

    /// Tier picked at checkout, required under a customer-choice policy.
    #[serde(default)]
    pub choice: Option<ChoiceTier>,

    /// Guide that runs the tour, for guide-scoped codes.
    #[ts(as = "Option<String>")]
    #[serde(default)]
    pub guide_id: Option<Uuid>,

    #[serde(default)]
    pub discount_code: Option<DiscountCode>,
}

impl PricingRequest {
    pub fn lead_time(&self) -> LeadTime {
        LeadTime::between(self.booked_at, self.tour_start)
    }
}

// =============================================================================
// Breakdown
// =============================================================================

/// Priced booking.
///
/// ## Invariants
/// - `deposit_amount + final_payment_amount == final_price`
/// - `total_discount == base_price - final_price`
/// - automatic discounts never exceed 40% of `base_price`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricingBreakdown {
    /// `base_price_per_person × participants`, before any adjustment.
    pub list_subtotal: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choice: Option<ChoiceTier>,
    /// Signed customer-choice surcharge (+) or reduction (−).
    pub choice_adjustment: Money,

    /// Subtotal the discounts are taken from.
    pub base_price: Money,

    pub early_bird_percent: Percent,
    pub group_percent: Percent,
    pub last_minute_percent: Percent,
    pub raw_stacked_percent: Percent,
    pub effective_percent: Percent,
    pub capped: bool,

    pub early_bird_discount: Money,
    pub group_discount: Money,
    pub last_minute_discount: Money,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub code_discount: Money,

    pub total_discount: Money,
    pub final_price: Money,

    pub deposit_amount: Money,
    pub final_payment_amount: Money,
    #[ts(as = "String")]
    pub final_payment_due: DateTime<Utc>,

    /// Refund percent if cancelled right after booking.
    pub refund_percent: Percent,
}

// =============================================================================
// Calculate
// =============================================================================

/// Prices `request` under `settings`.
///
/// ## Errors
/// - [`ConfigurationError`] for invalid settings, a missing or unexpected
///   customer-choice tier, or a negative amount at any step
/// - [`crate::RedemptionRejected`] when the attached code cannot be used
pub fn calculate(request: &PricingRequest, settings: &PolicySettings) -> PricingResult<PricingBreakdown> {
    settings.validate()?;

    if request.base_price_per_person.is_negative() {
        return Err(negative("basePricePerPerson", request.base_price_per_person).into());
    }

    let lead_time = request.lead_time();
    let refund_percent =
        resolve_refund_percent(&settings.cancellation, lead_time.days(), request.choice)?;

    let adjusted_price = match (&settings.cancellation, request.choice) {
        (CancellationPolicy::CustomerChoice, Some(tier)) => tier
            .adjust_price(request.base_price_per_person)
            .ok_or_else(|| overflow("basePricePerPerson"))?,
        _ => request.base_price_per_person,
    };

    let list_subtotal = request
        .base_price_per_person
        .checked_mul_count(request.participant_count)
        .ok_or_else(|| overflow("listSubtotal"))?;

    let stacked = apply_discounts(
        adjusted_price,
        request.participant_count,
        lead_time,
        &settings.early_bird,
        &settings.group_discount,
        &settings.last_minute,
    )?;
    let base_price = stacked.subtotal;
    let post_cap = stacked.discounted_subtotal();
    if post_cap.is_negative() {
        return Err(negative("discountedSubtotal", post_cap).into());
    }

    let (code, code_discount) = match &request.discount_code {
        Some(code) => {
            let amount = code.redeem_amount(request.booked_at, post_cap, request.guide_id)?;
            (Some(code.code.clone()), amount)
        }
        None => (None, Money::zero()),
    };

    let final_price = post_cap - code_discount;
    if final_price.is_negative() {
        return Err(negative("finalPrice", final_price).into());
    }

    let plan = schedule(final_price, &settings.deposit, request.tour_start, request.booked_at)?;
    let [early_bird_percent, group_percent, last_minute_percent] = stacked.reported_percents();

    debug!(
        participants = request.participant_count,
        lead_hours = lead_time.hours(),
        effective = %stacked.effective_percent,
        final_price = %final_price,
        "Priced booking"
    );

    Ok(PricingBreakdown {
        list_subtotal,
        choice: request.choice,
        choice_adjustment: base_price - list_subtotal,
        base_price,
        early_bird_percent,
        group_percent,
        last_minute_percent,
        raw_stacked_percent: stacked.raw_stacked_percent,
        effective_percent: stacked.effective_percent,
        capped: stacked.capped(),
        early_bird_discount: stacked.early_bird_discount,
        group_discount: stacked.group_discount,
        last_minute_discount: stacked.last_minute_discount,
        code,
        code_discount,
        total_discount: stacked.total_discount + code_discount,
        final_price,
        deposit_amount: plan.deposit_amount,
        final_payment_amount: plan.final_payment_amount,
        final_payment_due: plan.final_payment_due,
        refund_percent,
    })
}

fn overflow(field: &str) -> ConfigurationError {
    ConfigurationError::AmountOverflow {
        field: field.to_string(),
    }
}

fn negative(field: &str, amount: Money) -> ConfigurationError {
    ConfigurationError::NegativeAmount {
        field: field.to_string(),
        cents: amount.cents(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
