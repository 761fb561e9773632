//! # Tourbook Pricing Preview
//!
//! Admin tool that prices the reference booking under a guide's stored
//! policy and prints the breakdown.
//!
//! ## Module Organization
//! ```text
//! pricing_preview/
//! ├── lib.rs      ◄─── You are here (startup & run)
//! ├── config.rs   ◄─── PreviewConfig from TOURBOOK_* variables
//! ├── preview.rs  ◄─── Scenario, policy lookup, summary rendering
//! └── error.rs    ◄─── AppError with machine-readable codes
//! ```
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging)
//! 2. Read configuration from the environment
//! 3. Determine database path (app data directory unless overridden)
//! 4. Connect to database & run migrations
//! 5. Price the preview scenario and print it

pub mod config;
pub mod error;
pub mod preview;

use chrono::Utc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::PreviewConfig;
use error::{AppError, AppResult};
use preview::{render_summary, run_preview, PreviewScenario};
use tourbook_db::{Database, DbConfig};

/// Runs one preview against the configured database.
pub async fn run() -> AppResult<()> {
    let config = PreviewConfig::from_env();
    let db_path = config.database_path()?;
    info!(?db_path, guide_id = ?config.guide_id, "Starting pricing preview");

    let db = Database::new(DbConfig::new(db_path)).await?;
    info!("Database connected and migrations applied");

    let result = run_preview(
        &db.policies(),
        &db.discount_codes(),
        &config,
        &PreviewScenario::default(),
        Utc::now(),
    )
    .await;
    db.close().await;
    let report = result?;

    println!("{}", render_summary(&report, &config.currency_symbol));
    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| AppError::internal(format!("Could not serialize report: {}", e)))?;
    println!("{}", json);

    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=tourbook=trace` - Show trace for tourbook crates only
/// - Default: INFO, DEBUG for tourbook crates
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tourbook=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
