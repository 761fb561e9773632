//! # Seed Data Generator
//!
//! Populates a development database with guide policies and discount codes.
//!
//! ## Usage
//! ```bash
//! # Seed ./tourbook_dev.db with 3 guides
//! cargo run -p tourbook-db --bin seed
//!
//! # Custom amount and database path
//! cargo run -p tourbook-db --bin seed -- --guides 10 --db ./data/tourbook.db
//! ```
//!
//! ## Generated Data
//! - One policy per guide, cycling through the cancellation presets and
//!   customer choice
//! - Platform codes: `WELCOME10` (10%), `FLAT50` ($50 off, $100 minimum),
//!   `LAST1` (single use)
//! - One guide-scoped `GUIDE{n}-15` code per guide

use chrono::{Duration, Utc};
use std::env;
use tourbook_core::{
    CancellationPolicy, CodeScope, DepositPolicy, DiscountValue, LastMinuteSettings, Money,
    NewDiscountCode, Percent, PolicySettings, SinglePolicyType,
};
use tourbook_db::{Database, DbConfig, DiscountCodeStore, PolicyRepository};
use uuid::Uuid;

/// Cancellation approaches cycled across seeded guides
const POLICIES: &[Option<SinglePolicyType>] = &[
    Some(SinglePolicyType::Moderate),
    Some(SinglePolicyType::Flexible),
    Some(SinglePolicyType::Strict),
    None, // customer choice
];

/// Deposit percents cycled across seeded guides
const DEPOSIT_PERCENTS: &[u32] = &[30, 20, 50, 10];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut guides: usize = 3;
    let mut db_path = String::from("./tourbook_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--guides" | "-g" => {
                if i + 1 < args.len() {
                    guides = args[i + 1].parse().unwrap_or(3);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tourbook Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -g, --guides <N>   Number of guides to generate (default: 3)");
                println!("  -d, --db <PATH>    Database file path (default: ./tourbook_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Tourbook Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!("Guides:   {}", guides);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.discount_codes().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} discount codes", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();
    let codes = db.discount_codes();

    for new_code in platform_codes(now) {
        let created = codes.insert(new_code).await?;
        println!("  + platform code {}", created.code);
    }

    println!();
    println!("Generating guides...");
    for index in 0..guides {
        let guide_id = Uuid::new_v4();
        db.policies().save_policy(guide_id, &guide_settings(index)).await?;

        let created = codes.insert(guide_code(index, guide_id, now)).await?;
        println!("  + guide {} with code {}", guide_id, created.code);
    }

    println!();
    println!("✓ Seeded {} guides and {} codes", guides, codes.count().await?);

    db.close().await;
    Ok(())
}

fn guide_settings(index: usize) -> PolicySettings {
    let cancellation = match POLICIES[index % POLICIES.len()] {
        Some(policy_type) => CancellationPolicy::preset(policy_type),
        None => CancellationPolicy::CustomerChoice,
    };

    PolicySettings {
        last_minute: LastMinuteSettings {
            enabled: index % 2 == 1,
            ..LastMinuteSettings::default()
        },
        deposit: DepositPolicy::Percentage {
            amount_percent: Percent::from_whole(DEPOSIT_PERCENTS[index % DEPOSIT_PERCENTS.len()]),
            final_payment_days_before: 14,
        },
        cancellation,
        ..PolicySettings::default()
    }
}

fn platform_codes(now: chrono::DateTime<Utc>) -> Vec<NewDiscountCode> {
    let base = NewDiscountCode {
        code: String::new(),
        value: DiscountValue::Percentage(Percent::from_whole(10)),
        scope: CodeScope::Platform,
        guide_id: None,
        valid_from: now - Duration::days(1),
        valid_until: Some(now + Duration::days(90)),
        max_uses: None,
        min_purchase_amount: None,
    };

    vec![
        NewDiscountCode {
            code: "WELCOME10".to_string(),
            ..base.clone()
        },
        NewDiscountCode {
            code: "FLAT50".to_string(),
            value: DiscountValue::Fixed(Money::from_major_minor(50, 0)),
            min_purchase_amount: Some(Money::from_major_minor(100, 0)),
            ..base.clone()
        },
        NewDiscountCode {
            code: "LAST1".to_string(),
            max_uses: Some(1),
            ..base
        },
    ]
}

fn guide_code(index: usize, guide_id: Uuid, now: chrono::DateTime<Utc>) -> NewDiscountCode {
    NewDiscountCode {
        code: format!("GUIDE{}-15", index + 1),
        value: DiscountValue::Percentage(Percent::from_whole(15)),
        scope: CodeScope::Guide,
        guide_id: Some(guide_id),
        valid_from: now - Duration::days(1),
        valid_until: None,
        max_uses: Some(100),
        min_purchase_amount: None,
    }
}
