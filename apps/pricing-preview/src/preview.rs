//! # Pricing Preview
//!
//! Prices a reference booking under a guide's stored policy so the guide can
//! see what a buyer would pay before publishing a change.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PreviewConfig                                                          │
//! │       │ guide_id                 │ discount_code                        │
//! │       ▼                          ▼                                      │
//! │  load_policy(guide) ──┐    find_by_code(code) ──┐                       │
//! │   (or default)        │      (never redeemed)   │                       │
//! │                       ▼                         ▼                       │
//! │              PreviewScenario::request ──► calculate()                   │
//! │                                                 │                       │
//! │                                                 ▼                       │
//! │                                  PreviewReport { breakdown, ... }       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;
use tourbook_core::code::normalize_code;
use tourbook_core::{
    calculate, CancellationPolicy, ChoiceTier, DiscountCode, Money,
    PolicySettings, PricingBreakdown, PricingRequest, RedemptionRejected, RejectionReason,
};
use tourbook_db::{DiscountCodeStore, PolicyRepository};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::PreviewConfig;
use crate::error::AppResult;

// =============================================================================
// Scenario
// =============================================================================

/// Reference booking shown in the admin preview panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewScenario {
    pub price_per_person: Money,
    pub participants: u32,
    pub lead_days: i64,
}

impl Default for PreviewScenario {
    /// $250 per person, 4 people, booked 45 days out.
    fn default() -> Self {
        PreviewScenario {
            price_per_person: Money::from_major_minor(250, 0),
            participants: 4,
            lead_days: 45,
        }
    }
}

impl PreviewScenario {
    /// Builds the request as if booked at `now`.
    pub fn request(
        &self,
        now: DateTime<Utc>,
        guide_id: Option<Uuid>,
        choice: Option<ChoiceTier>,
        discount_code: Option<DiscountCode>,
    ) -> PricingRequest {
        PricingRequest {
            base_price_per_person: self.price_per_person,
            participant_count: self.participants,
            booked_at: now,
            tour_start: now + Duration::days(self.lead_days),
            choice,
            guide_id,
            discount_code,
        }
    }
}

// =============================================================================
// Report
// =============================================================================

/// Where the previewed settings came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicySource {
    Stored,
    PlatformDefault,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guide_id: Option<Uuid>,
    pub policy_source: PolicySource,
    pub breakdown: PricingBreakdown,
}

/// Loads the guide's settings, or the platform default when there is no
/// guide or nothing stored for it.
pub async fn load_settings<P>(
    policies: &P,
    guide_id: Option<Uuid>,
) -> AppResult<(PolicySettings, PolicySource)>
where
    P: PolicyRepository + ?Sized,
{
    let Some(guide_id) = guide_id else {
        return Ok((PolicySettings::default(), PolicySource::PlatformDefault));
    };

    match policies.load_policy(guide_id).await? {
        Some(settings) => Ok((settings, PolicySource::Stored)),
        None => {
            info!(guide_id = %guide_id, "No stored policy, previewing platform default");
            Ok((PolicySettings::default(), PolicySource::PlatformDefault))
        }
    }
}

/// Prices `scenario` for the configured guide.
///
/// A configured discount code is looked up and priced, but its usage count
/// is left untouched.
pub async fn run_preview<P, C>(
    policies: &P,
    codes: &C,
    config: &PreviewConfig,
    scenario: &PreviewScenario,
    now: DateTime<Utc>,
) -> AppResult<PreviewReport>
where
    P: PolicyRepository + ?Sized,
    C: DiscountCodeStore + ?Sized,
{
    let (settings, policy_source) = load_settings(policies, config.guide_id).await?;

    let choice = match settings.cancellation {
        CancellationPolicy::CustomerChoice => Some(config.choice),
        CancellationPolicy::Single { .. } => None,
    };

    let discount_code = match &config.discount_code {
        Some(raw) => match codes.find_by_code(raw).await? {
            Some(code) => Some(code),
            None => {
                return Err(
                    RedemptionRejected::new(normalize_code(raw), RejectionReason::NotFound).into(),
                )
            }
        },
        None => None,
    };

    let request = scenario.request(now, config.guide_id, choice, discount_code);
    let breakdown = calculate(&request, &settings)?;

    debug!(
        guide_id = ?config.guide_id,
        source = ?policy_source,
        final_cents = breakdown.final_price.cents(),
        "Preview priced"
    );

    Ok(PreviewReport {
        guide_id: config.guide_id,
        policy_source,
        breakdown,
    })
}

// =============================================================================
// Rendering
// =============================================================================

/// Formats an amount with a configurable currency symbol: `-€12.50`.
pub fn format_amount(amount: Money, symbol: &str) -> String {
    let sign = if amount.is_negative() { "-" } else { "" };
    format!(
        "{}{}{}.{:02}",
        sign,
        symbol,
        amount.dollars().abs(),
        amount.cents_part().abs()
    )
}

/// Plain-text summary for the terminal.
pub fn render_summary(report: &PreviewReport, symbol: &str) -> String {
    Summary { report, symbol }.to_string()
}

struct Summary<'a> {
    report: &'a PreviewReport,
    symbol: &'a str,
}

impl Summary<'_> {
    fn amount(&self, amount: Money) -> String {
        format_amount(amount, self.symbol)
    }
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.report.breakdown;

        writeln!(f, "Policy:            {:?}", self.report.policy_source)?;
        if let Some(choice) = b.choice {
            writeln!(f, "Cancellation tier: {}", choice)?;
        }
        writeln!(f, "List subtotal:     {}", self.amount(b.list_subtotal))?;
        if !b.choice_adjustment.is_zero() {
            writeln!(f, "Tier adjustment:   {}", self.amount(b.choice_adjustment))?;
        }
        writeln!(f, "Subtotal:          {}", self.amount(b.base_price))?;
        writeln!(
            f,
            "Early bird:        {} (-{})",
            b.early_bird_percent,
            self.amount(b.early_bird_discount)
        )?;
        writeln!(
            f,
            "Group:             {} (-{})",
            b.group_percent,
            self.amount(b.group_discount)
        )?;
        writeln!(
            f,
            "Last minute:       {} (-{})",
            b.last_minute_percent,
            self.amount(b.last_minute_discount)
        )?;
        if b.capped {
            writeln!(
                f,
                "Stacking cap:      {} reduced to {}",
                b.raw_stacked_percent, b.effective_percent
            )?;
        }
        if let Some(code) = &b.code {
            writeln!(f, "Code {}:       -{}", code, self.amount(b.code_discount))?;
        }
        writeln!(f, "Total discount:    {}", self.amount(b.total_discount))?;
        writeln!(f, "Final price:       {}", self.amount(b.final_price))?;
        writeln!(f, "Deposit today:     {}", self.amount(b.deposit_amount))?;
        if b.final_payment_amount.is_positive() {
            writeln!(
                f,
                "Final payment:     {} due {}",
                self.amount(b.final_payment_amount),
                b.final_payment_due.format("%Y-%m-%d")
            )?;
        }
        writeln!(f, "Refund if cancelled now: {}", b.refund_percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tourbook_core::{CodeScope, DiscountValue, NewDiscountCode, Percent};
    use tourbook_db::{Database, DbConfig};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn welcome10(now: DateTime<Utc>) -> NewDiscountCode {
        NewDiscountCode {
            code: "WELCOME10".to_string(),
            value: DiscountValue::Percentage(Percent::from_whole(10)),
            scope: CodeScope::Platform,
            guide_id: None,
            valid_from: now - Duration::days(1),
            valid_until: None,
            max_uses: Some(1),
            min_purchase_amount: None,
        }
    }

    #[tokio::test]
    async fn test_default_preview_matches_documented_scenario() {
        let db = db().await;
        let report = run_preview(
            &db.policies(),
            &db.discount_codes(),
            &PreviewConfig::default(),
            &PreviewScenario::default(),
            Utc::now(),
        )
        .await
        .unwrap();

        let b = &report.breakdown;
        assert_eq!(report.policy_source, PolicySource::PlatformDefault);
        assert_eq!(b.early_bird_percent, Percent::from_whole(7));
        assert_eq!(b.group_percent, Percent::from_whole(10));
        assert_eq!(b.base_price, Money::from_major_minor(1000, 0));
        assert_eq!(b.total_discount, Money::from_major_minor(170, 0));
        assert_eq!(b.final_price, Money::from_major_minor(830, 0));
        assert_eq!(b.deposit_amount, Money::from_major_minor(249, 0));
        assert_eq!(b.final_payment_amount, Money::from_major_minor(581, 0));
    }

    #[tokio::test]
    async fn test_unknown_guide_falls_back_to_default() {
        let db = db().await;
        let config = PreviewConfig {
            guide_id: Some(Uuid::new_v4()),
            ..PreviewConfig::default()
        };
        let (settings, source) = load_settings(&db.policies(), config.guide_id)
            .await
            .unwrap();
        assert_eq!(source, PolicySource::PlatformDefault);
        assert_eq!(settings, PolicySettings::default());
    }

    #[tokio::test]
    async fn test_stored_customer_choice_policy_uses_configured_tier() {
        let db = db().await;
        let guide = Uuid::new_v4();
        let settings = PolicySettings {
            cancellation: CancellationPolicy::CustomerChoice,
            ..PolicySettings::default()
        };
        db.policies().save_policy(guide, &settings).await.unwrap();

        let config = PreviewConfig {
            guide_id: Some(guide),
            choice: ChoiceTier::NonRefundable,
            ..PreviewConfig::default()
        };
        let report = run_preview(
            &db.policies(),
            &db.discount_codes(),
            &config,
            &PreviewScenario::default(),
            Utc::now(),
        )
        .await
        .unwrap();

        let b = &report.breakdown;
        assert_eq!(report.policy_source, PolicySource::Stored);
        assert_eq!(b.choice, Some(ChoiceTier::NonRefundable));
        assert_eq!(b.base_price, Money::from_major_minor(900, 0));
        assert_eq!(b.final_price, Money::from_major_minor(747, 0));
        assert_eq!(b.refund_percent, Percent::ZERO);
    }

    #[tokio::test]
    async fn test_preview_prices_code_without_redeeming_it() {
        let db = db().await;
        let now = Utc::now();
        let codes = db.discount_codes();
        codes.insert(welcome10(now)).await.unwrap();

        let config = PreviewConfig {
            discount_code: Some("welcome10".to_string()),
            ..PreviewConfig::default()
        };
        for _ in 0..2 {
            let report = run_preview(
                &db.policies(),
                &codes,
                &config,
                &PreviewScenario::default(),
                now,
            )
            .await
            .unwrap();
            assert_eq!(report.breakdown.code.as_deref(), Some("WELCOME10"));
            assert_eq!(report.breakdown.code_discount, Money::from_major_minor(83, 0));
            assert_eq!(report.breakdown.final_price, Money::from_major_minor(747, 0));
        }

        let stored = codes.find_by_code("WELCOME10").await.unwrap().unwrap();
        assert_eq!(stored.times_used, 0);
    }

    #[tokio::test]
    async fn test_missing_code_is_rejected_as_not_found() {
        let db = db().await;
        let config = PreviewConfig {
            discount_code: Some("nope-123".to_string()),
            ..PreviewConfig::default()
        };
        let err = run_preview(
            &db.policies(),
            &db.discount_codes(),
            &config,
            &PreviewScenario::default(),
            Utc::now(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::CodeRejected);
        assert_eq!(err.reason, Some(RejectionReason::NotFound));
        assert!(err.message.contains("NOPE-123"));
    }

    #[test]
    fn test_format_amount_uses_symbol() {
        assert_eq!(format_amount(Money::from_cents(83_000), "€"), "€830.00");
        assert_eq!(format_amount(Money::from_cents(-1_250), "$"), "-$12.50");
        assert_eq!(format_amount(Money::zero(), "£"), "£0.00");
    }

    #[tokio::test]
    async fn test_render_summary_lists_key_lines() {
        let db = db().await;
        let report = run_preview(
            &db.policies(),
            &db.discount_codes(),
            &PreviewConfig::default(),
            &PreviewScenario::default(),
            Utc::now(),
        )
        .await
        .unwrap();

        let text = render_summary(&report, "€");
        assert!(text.contains("Final price:       €830.00"));
        assert!(text.contains("Deposit today:     €249.00"));
        assert!(text.contains("Early bird:        7% (-€70.00)"));
        assert!(!text.contains("Stacking cap"));
    }
}
