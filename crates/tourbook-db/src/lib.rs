//! # tourbook-db: Database Layer for Tourbook
//!
//! SQLite persistence for guide policies and discount codes, including the
//! atomic redeem-if-available update that keeps `times_used` within
//! `max_uses` under concurrent checkouts.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tourbook Data Flow                               │
//! │                                                                         │
//! │  Checkout / Pricing Preview                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   tourbook-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐  │   │
//! │  │   │   Database    │    │   Repositories     │  │ Migrations │  │   │
//! │  │   │   (pool.rs)   │◄───│ SqlitePolicyRepo   │  │ (embedded) │  │   │
//! │  │   │  SqlitePool   │    │ DiscountCodeRepo   │  │ 001_*.sql  │  │   │
//! │  │   └───────────────┘    └────────────────────┘  └────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tourbook_db::{redeem, Database, DbConfig, PolicyRepository};
//!
//! let db = Database::new(DbConfig::new("tourbook.db")).await?;
//! let settings = db.policies().load_policy(guide_id).await?.unwrap_or_default();
//! let outcome = redeem(&db.discount_codes(), "summer10", purchase, Some(guide_id), Utc::now()).await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult, RedeemError};
pub use pool::{Database, DbConfig};

pub use repository::discount_code::{redeem, DiscountCodeRepository, MAX_REDEEM_ATTEMPTS};
pub use repository::policy::SqlitePolicyRepository;
pub use repository::{DiscountCodeStore, PolicyRepository};
