//! End-to-end pricing scenarios over the public API.

use chrono::{DateTime, Duration, TimeZone, Utc};
use tourbook_core::{
    calculate, CancellationPolicy, ChoiceTier, CodeScope, DepositPolicy, DiscountCode,
    DiscountValue, EarlyBirdSettings, EarlyBirdTier, GroupDiscountSettings, GroupTier,
    LastMinuteSettings, Money, Percent, PolicySettings, PricingRequest,
};
use uuid::Uuid;

fn booked_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

fn request(price_cents: i64, participants: u32, days: i64) -> PricingRequest {
    PricingRequest {
        base_price_per_person: Money::from_cents(price_cents),
        participant_count: participants,
        booked_at: booked_at(),
        tour_start: booked_at() + Duration::days(days),
        choice: None,
        guide_id: None,
        discount_code: None,
    }
}

fn aggressive_settings() -> PolicySettings {
    PolicySettings {
        early_bird: EarlyBirdSettings {
            enabled: true,
            tiers: vec![
                EarlyBirdTier {
                    days_or_more: 60,
                    percent: Percent::from_whole(30),
                },
                EarlyBirdTier {
                    days_or_more: 7,
                    percent: Percent::from_whole(12),
                },
            ],
        },
        group_discount: GroupDiscountSettings {
            enabled: true,
            tiers: vec![
                GroupTier {
                    min_count: 2,
                    max_count: Some(5),
                    percent: Percent::from_whole(8),
                },
                GroupTier {
                    min_count: 6,
                    max_count: None,
                    percent: Percent::from_whole(20),
                },
            ],
        },
        last_minute: LastMinuteSettings {
            enabled: true,
            hours_or_less: 72,
            percent: Percent::from_whole(15),
        },
        ..PolicySettings::default()
    }
}

#[test]
fn test_documented_preview_scenario() {
    let breakdown = calculate(&request(25_000, 4, 45), &PolicySettings::default()).unwrap();

    assert_eq!(breakdown.early_bird_percent, Percent::from_whole(7));
    assert_eq!(breakdown.group_percent, Percent::from_whole(10));
    assert_eq!(breakdown.effective_percent, Percent::from_whole(17));
    assert_eq!(breakdown.base_price, Money::from_cents(100_000));
    assert_eq!(breakdown.total_discount, Money::from_cents(17_000));
    assert_eq!(breakdown.final_price, Money::from_cents(83_000));
    assert_eq!(breakdown.deposit_amount, Money::from_cents(24_900));
    assert_eq!(breakdown.final_payment_amount, Money::from_cents(58_100));
}

#[test]
fn test_cap_scenario() {
    let settings = PolicySettings {
        early_bird: EarlyBirdSettings {
            enabled: true,
            tiers: vec![EarlyBirdTier {
                days_or_more: 60,
                percent: Percent::from_whole(30),
            }],
        },
        group_discount: GroupDiscountSettings {
            enabled: true,
            tiers: vec![GroupTier {
                min_count: 6,
                max_count: None,
                percent: Percent::from_whole(20),
            }],
        },
        ..PolicySettings::default()
    };

    let breakdown = calculate(&request(25_000, 6, 70), &settings).unwrap();
    assert_eq!(breakdown.raw_stacked_percent, Percent::from_whole(50));
    assert_eq!(breakdown.effective_percent, Percent::from_whole(40));
    assert!(breakdown.capped);
    assert_eq!(breakdown.early_bird_percent, Percent::from_whole(24));
    assert_eq!(breakdown.group_percent, Percent::from_whole(16));
    assert_eq!(breakdown.total_discount, Money::from_cents(60_000));
}

#[test]
fn test_customer_choice_ordering() {
    let settings = PolicySettings {
        early_bird: EarlyBirdSettings {
            enabled: true,
            tiers: vec![EarlyBirdTier {
                days_or_more: 0,
                percent: Percent::from_whole(10),
            }],
        },
        group_discount: GroupDiscountSettings::disabled(),
        cancellation: CancellationPolicy::CustomerChoice,
        ..PolicySettings::default()
    };
    let mut req = request(10_000, 1, 20);
    req.choice = Some(ChoiceTier::NonRefundable);

    let breakdown = calculate(&req, &settings).unwrap();
    assert_eq!(breakdown.base_price, Money::from_cents(9_000));
    assert_eq!(breakdown.total_discount, Money::from_cents(900));
    assert_eq!(breakdown.final_price, Money::from_cents(8_100));
}

#[test]
fn test_fixed_code_exceeding_purchase() {
    let settings = PolicySettings {
        early_bird: EarlyBirdSettings::disabled(),
        group_discount: GroupDiscountSettings::disabled(),
        ..PolicySettings::default()
    };
    let mut req = request(2_000, 1, 45);
    req.discount_code = Some(DiscountCode {
        id: Uuid::new_v4(),
        code: "FLAT50".to_string(),
        value: DiscountValue::Fixed(Money::from_cents(5_000)),
        scope: CodeScope::Platform,
        guide_id: None,
        valid_from: booked_at() - Duration::days(1),
        valid_until: None,
        max_uses: Some(10),
        times_used: 0,
        min_purchase_amount: None,
        active: true,
    });

    let breakdown = calculate(&req, &settings).unwrap();
    assert_eq!(breakdown.code_discount, Money::from_cents(2_000));
    assert!(breakdown.final_price.is_zero());
}

#[test]
fn test_stacking_cap_holds_across_inputs() {
    let settings = aggressive_settings();
    for price in [1, 333, 2_499, 12_345, 99_999] {
        for participants in 0..9 {
            for hours in [1, 48, 72, 200, 24 * 90] {
                let mut req = request(price, participants, 0);
                req.tour_start = booked_at() + Duration::hours(hours);
                let breakdown = calculate(&req, &settings).unwrap();

                let automatic = breakdown.early_bird_discount
                    + breakdown.group_discount
                    + breakdown.last_minute_discount;
                assert!(automatic.cents() * 100 <= breakdown.base_price.cents() * 40);
                assert_eq!(
                    breakdown.total_discount,
                    breakdown.base_price - breakdown.final_price
                );
            }
        }
    }
}

#[test]
fn test_one_cent_price_far_out_stays_under_cap() {
    let settings = aggressive_settings();
    for participants in [2, 4] {
        let mut req = request(1, participants, 0);
        req.tour_start = booked_at() + Duration::hours(24 * 90);
        let breakdown = calculate(&req, &settings).unwrap();

        let automatic = breakdown.early_bird_discount
            + breakdown.group_discount
            + breakdown.last_minute_discount;
        assert!(
            automatic.cents() * 100 <= breakdown.base_price.cents() * 40,
            "{} cents off {} cents",
            automatic.cents(),
            breakdown.base_price.cents()
        );
        assert!(!breakdown.final_price.is_negative());
    }
}

#[test]
fn test_deposit_split_always_sums() {
    let policies = [
        DepositPolicy::None,
        DepositPolicy::Percentage {
            amount_percent: Percent::from_whole(10),
            final_payment_days_before: 7,
        },
        DepositPolicy::Percentage {
            amount_percent: Percent::from_bps(3_333),
            final_payment_days_before: 30,
        },
        DepositPolicy::Percentage {
            amount_percent: Percent::from_whole(50),
            final_payment_days_before: 60,
        },
    ];
    for deposit in policies {
        let settings = PolicySettings {
            deposit,
            ..PolicySettings::default()
        };
        for price in [0, 1, 999, 25_000, 33_333] {
            for days in [1, 14, 45, 120] {
                let breakdown = calculate(&request(price, 3, days), &settings).unwrap();
                assert_eq!(
                    breakdown.deposit_amount + breakdown.final_payment_amount,
                    breakdown.final_price
                );
            }
        }
    }
}

#[test]
fn test_early_bird_monotonic() {
    let settings = PolicySettings::default();
    let mut previous = Percent::ZERO;
    for days in 0..120 {
        let breakdown = calculate(&request(25_000, 1, days), &settings).unwrap();
        assert!(breakdown.early_bird_percent >= previous);
        previous = breakdown.early_bird_percent;
    }
}

#[test]
fn test_calculate_is_idempotent() {
    let settings = aggressive_settings();
    let req = request(12_345, 7, 65);

    let first = serde_json::to_string(&calculate(&req, &settings).unwrap()).unwrap();
    let second = serde_json::to_string(&calculate(&req, &settings).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_settings_json_drives_calculation() {
    let json = r#"{
        "earlyBird": { "enabled": true, "tiers": [{ "daysOrMore": 30, "percent": 7 }] },
        "groupDiscount": { "enabled": true, "tiers": [{ "minCount": 4, "maxCount": 5, "percent": 10 }] },
        "lastMinute": { "enabled": false, "hoursOrLess": 48, "percent": 10 },
        "deposit": { "type": "percentage", "amountPercent": 30, "finalPaymentDaysBefore": 14 },
        "cancellation": { "approach": "single", "singlePolicyType": "moderate" }
    }"#;
    let settings = PolicySettings::from_json(json).unwrap();
    let breakdown = calculate(&request(25_000, 4, 45), &settings).unwrap();
    assert_eq!(breakdown.final_price, Money::from_cents(83_000));

    let json = serde_json::to_value(&breakdown).unwrap();
    assert_eq!(json["finalPrice"], 83_000);
    assert_eq!(json["effectivePercent"], 17);
    assert_eq!(json["depositAmount"], 24_900);
}
