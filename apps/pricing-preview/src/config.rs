//! # Preview Configuration
//!
//! Settings for a preview run, loaded once at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`TOURBOOK_*`)
//! 2. Defaults (this file)
//!
//! Unparseable values are logged and ignored, leaving the default in place.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tourbook_core::ChoiceTier;
use tracing::warn;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// File name used inside the platform data directory.
pub const DATABASE_FILE: &str = "tourbook.db";

/// Preview run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewConfig {
    /// Explicit database file. `None` means the platform data directory.
    pub db_path: Option<PathBuf>,

    /// Guide whose stored policy is previewed.
    /// `None` previews the platform default settings.
    pub guide_id: Option<Uuid>,

    /// Symbol printed in front of amounts in the text summary.
    pub currency_symbol: String,

    /// Code to price against (looked up, never redeemed).
    pub discount_code: Option<String>,

    /// Tier used when the guide offers customer choice.
    pub choice: ChoiceTier,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        PreviewConfig {
            db_path: None,
            guide_id: None,
            currency_symbol: "$".to_string(),
            discount_code: None,
            choice: ChoiceTier::Standard,
        }
    }
}

impl PreviewConfig {
    /// Creates a config from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `TOURBOOK_DB_PATH`: database file
    /// - `TOURBOOK_GUIDE_ID`: guide UUID
    /// - `TOURBOOK_CURRENCY_SYMBOL`: e.g. `"€"`
    /// - `TOURBOOK_DISCOUNT_CODE`: code to include in the preview
    /// - `TOURBOOK_CHOICE`: `ultra_flexible`, `standard` or `non_refundable`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = PreviewConfig::default();

        if let Some(path) = lookup("TOURBOOK_DB_PATH").filter(|p| !p.trim().is_empty()) {
            config.db_path = Some(PathBuf::from(path));
        }

        if let Some(raw) = lookup("TOURBOOK_GUIDE_ID") {
            match raw.trim().parse::<Uuid>() {
                Ok(id) => config.guide_id = Some(id),
                Err(e) => warn!(value = %raw, error = %e, "Ignoring invalid TOURBOOK_GUIDE_ID"),
            }
        }

        if let Some(symbol) = lookup("TOURBOOK_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol;
        }

        if let Some(code) = lookup("TOURBOOK_DISCOUNT_CODE").filter(|c| !c.trim().is_empty()) {
            config.discount_code = Some(code);
        }

        if let Some(raw) = lookup("TOURBOOK_CHOICE") {
            match raw.trim().parse::<ChoiceTier>() {
                Ok(choice) => config.choice = choice,
                Err(e) => warn!(value = %raw, error = %e, "Ignoring invalid TOURBOOK_CHOICE"),
            }
        }

        config
    }

    /// Resolves the database file, creating the data directory if needed.
    ///
    /// ## Platform-Specific Paths
    /// - **macOS**: `~/Library/Application Support/com.tourbook.tourbook/tourbook.db`
    /// - **Windows**: `%APPDATA%\tourbook\tourbook\data\tourbook.db`
    /// - **Linux**: `~/.local/share/tourbook/tourbook.db`
    pub fn database_path(&self) -> AppResult<PathBuf> {
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }

        let dirs = ProjectDirs::from("com", "tourbook", "tourbook")
            .ok_or_else(|| AppError::internal("Could not determine app data directory"))?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        Ok(data_dir.join(DATABASE_FILE))
    }
}
