//! # Discount Code Repository
//!
//! Code storage and the atomic redemption used at checkout.
//!
//! ## Atomic Redemption
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Checkout A                         Checkout B                          │
//! │      │                                  │                               │
//! │      ▼                                  ▼                               │
//! │  UPDATE discount_codes                UPDATE discount_codes             │
//! │    SET times_used = times_used + 1      (waits on the write lock)       │
//! │  WHERE code = 'LAST1'                       │                           │
//! │    AND active AND in window                 │                           │
//! │    AND times_used < max_uses                │                           │
//! │  RETURNING *        ──► 1 row               ▼                           │
//! │      │                                 0 rows (times_used = max_uses)   │
//! │      ▼                                      │                           │
//! │  confirm on the RETURNED row            re-read → EXHAUSTED             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The redeemability rules run inside the UPDATE's WHERE clause, so the
//! counter can never pass `max_uses` no matter how many checkouts race.
//! A pre-fetched snapshot is only used to explain a refusal.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info, warn};
use tourbook_core::code::{confirm_redemption, normalize_code};
use tourbook_core::{
    CodeScope, DiscountCode, DiscountType, DiscountValue, Money, NewDiscountCode, RedeemOutcome,
    RedemptionRejected, RejectionReason, ValidationError,
};
use uuid::Uuid;

use crate::error::{DbError, DbResult, RedeemError};
use crate::repository::DiscountCodeStore;

/// How many times [`redeem`] retries when the UPDATE refused a code whose
/// re-read snapshot still looks redeemable.
pub const MAX_REDEEM_ATTEMPTS: usize = 3;

const CODE_COLUMNS: &str = "id, code, discount_type, value, scope, guide_id, valid_from, \
     valid_until, max_uses, times_used, min_purchase_cents, active";

// =============================================================================
// Row Mapping
// =============================================================================

/// One `discount_codes` row as stored.
#[derive(Debug, Clone, FromRow)]
struct DiscountCodeRow {
    id: String,
    code: String,
    discount_type: DiscountType,
    value: i64,
    scope: CodeScope,
    guide_id: Option<String>,
    valid_from: i64,
    valid_until: Option<i64>,
    max_uses: Option<i64>,
    times_used: i64,
    min_purchase_cents: Option<i64>,
    active: bool,
}

impl TryFrom<DiscountCodeRow> for DiscountCode {
    type Error = DbError;

    fn try_from(row: DiscountCodeRow) -> Result<Self, Self::Error> {
        let id = parse_uuid("id", &row.id)?;
        let guide_id = row
            .guide_id
            .as_deref()
            .map(|raw| parse_uuid("guide_id", raw))
            .transpose()?;
        let value = DiscountValue::from_raw(row.discount_type, row.value).ok_or_else(|| {
            DbError::invalid_record(format!("code {}: value {} out of range", row.code, row.value))
        })?;

        Ok(DiscountCode {
            id,
            code: row.code,
            value,
            scope: row.scope,
            guide_id,
            valid_from: from_millis("valid_from", row.valid_from)?,
            valid_until: row
                .valid_until
                .map(|millis| from_millis("valid_until", millis))
                .transpose()?,
            max_uses: row.max_uses,
            times_used: row.times_used,
            min_purchase_amount: row.min_purchase_cents.map(Money::from_cents),
            active: row.active,
        })
    }
}

fn parse_uuid(column: &str, raw: &str) -> DbResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| DbError::invalid_record(format!("{} '{}': {}", column, raw, e)))
}

fn from_millis(column: &str, millis: i64) -> DbResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| DbError::invalid_record(format!("{} {} is not a valid timestamp", column, millis)))
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct DiscountCodeRepository {
    pool: SqlitePool,
}

impl DiscountCodeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DiscountCodeRepository { pool }
    }

    /// Codes owned by `guide_id`, ordered by code.
    pub async fn list_for_guide(&self, guide_id: Uuid) -> DbResult<Vec<DiscountCode>> {
        let sql = format!(
            "SELECT {} FROM discount_codes WHERE guide_id = ?1 ORDER BY code",
            CODE_COLUMNS
        );
        let rows: Vec<DiscountCodeRow> = sqlx::query_as(&sql)
            .bind(guide_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(DiscountCode::try_from).collect()
    }

    /// Platform-wide codes, ordered by code.
    pub async fn list_platform(&self) -> DbResult<Vec<DiscountCode>> {
        let sql = format!(
            "SELECT {} FROM discount_codes WHERE scope = 'platform' ORDER BY code",
            CODE_COLUMNS
        );
        let rows: Vec<DiscountCodeRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        rows.into_iter().map(DiscountCode::try_from).collect()
    }

    /// Total number of stored codes.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM discount_codes")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl DiscountCodeStore for DiscountCodeRepository {
    async fn find_by_code(&self, code: &str) -> DbResult<Option<DiscountCode>> {
        let sql = format!("SELECT {} FROM discount_codes WHERE code = ?1", CODE_COLUMNS);
        let row: Option<DiscountCodeRow> = sqlx::query_as(&sql)
            .bind(normalize_code(code))
            .fetch_optional(&self.pool)
            .await?;

        row.map(DiscountCode::try_from).transpose()
    }

    async fn insert(&self, new_code: NewDiscountCode) -> DbResult<DiscountCode> {
        let code = new_code.into_code()?;
        let now = Utc::now().timestamp_millis();

        debug!(code = %code.code, scope = ?code.scope, "Inserting discount code");

        let result = sqlx::query(
            r#"
            INSERT INTO discount_codes (
                id, code, discount_type, value, scope, guide_id,
                valid_from, valid_until, max_uses, times_used,
                min_purchase_cents, active, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?13
            )
            "#,
        )
        .bind(code.id.to_string())
        .bind(&code.code)
        .bind(code.value.discount_type())
        .bind(code.value.raw_value())
        .bind(code.scope)
        .bind(code.guide_id.map(|id| id.to_string()))
        .bind(code.valid_from.timestamp_millis())
        .bind(code.valid_until.map(|until| until.timestamp_millis()))
        .bind(code.max_uses)
        .bind(code.times_used)
        .bind(code.min_purchase_amount.map(|m| m.cents()))
        .bind(code.active)
        .bind(now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                info!(code = %code.code, "Discount code created");
                Ok(code)
            }
            Err(err) => {
                let err = DbError::from(err);
                if err.is_unique_violation() {
                    Err(ValidationError::Duplicate {
                        field: "code".to_string(),
                        value: code.code,
                    }
                    .into())
                } else {
                    Err(err)
                }
            }
        }
    }

    async fn set_active(&self, code: &str, active: bool) -> DbResult<()> {
        let normalized = normalize_code(code);
        let result = sqlx::query(
            "UPDATE discount_codes SET active = ?2, updated_at = ?3 WHERE code = ?1",
        )
        .bind(&normalized)
        .bind(active)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("DiscountCode", normalized));
        }

        info!(code = %normalized, active, "Discount code toggled");
        Ok(())
    }

    async fn redeem_if_available(
        &self,
        code: &str,
        purchase: Money,
        guide_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<Option<RedeemOutcome>, RedeemError> {
        let normalized = normalize_code(code);
        let now_millis = now.timestamp_millis();

        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            UPDATE discount_codes SET
                times_used = times_used + 1,
                updated_at = ?1
            WHERE code = ?2
              AND active = 1
              AND valid_from <= ?1
              AND (valid_until IS NULL OR valid_until >= ?1)
              AND (max_uses IS NULL OR times_used < max_uses)
              AND (min_purchase_cents IS NULL OR min_purchase_cents <= ?3)
              AND (scope = 'platform' OR guide_id = ?4)
            RETURNING {}
            "#,
            CODE_COLUMNS
        );
        let row: Option<DiscountCodeRow> = sqlx::query_as(&sql)
            .bind(now_millis)
            .bind(&normalized)
            .bind(purchase.cents())
            .bind(guide_id.map(|id| id.to_string()))
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            debug!(code = %normalized, "No redeemable row");
            return Ok(None);
        };

        let updated = DiscountCode::try_from(row)?;
        match confirm_redemption(&updated, now, purchase, guide_id) {
            Ok(outcome) => {
                tx.commit().await?;
                Ok(Some(outcome))
            }
            Err(rejected) => {
                // The UPDATE matched a row the rules refuse: undo the increment
                warn!(code = %normalized, reason = rejected.reason.as_str(), "Redemption not confirmed");
                tx.rollback().await?;
                Err(rejected.into())
            }
        }
    }
}

// =============================================================================
// Checkout Redemption
// =============================================================================

/// Redeems `code` on `purchase` at checkout.
///
/// ## Flow
/// 1. Atomic conditional increment; on success the returned row is confirmed
/// 2. Otherwise the code is re-read to explain the refusal
///    (`NOT_FOUND`, `INACTIVE`, `EXPIRED`, `EXHAUSTED`, `BELOW_MINIMUM`)
/// 3. If the re-read still looks redeemable the state changed under us:
///    retry, up to [`MAX_REDEEM_ATTEMPTS`] times, then report `EXHAUSTED`
pub async fn redeem<S>(
    store: &S,
    code: &str,
    purchase: Money,
    guide_id: Option<Uuid>,
    now: DateTime<Utc>,
) -> Result<RedeemOutcome, RedeemError>
where
    S: DiscountCodeStore + ?Sized,
{
    let normalized = normalize_code(code);

    for attempt in 1..=MAX_REDEEM_ATTEMPTS {
        if let Some(outcome) = store
            .redeem_if_available(&normalized, purchase, guide_id, now)
            .await?
        {
            info!(
                code = %outcome.code,
                discount = %outcome.discount_amount,
                times_used = outcome.times_used,
                "Discount code redeemed"
            );
            return Ok(outcome);
        }

        let Some(current) = store.find_by_code(&normalized).await? else {
            return Err(RedemptionRejected::new(normalized, RejectionReason::NotFound).into());
        };

        if let Err(rejected) = current.check_redeemable(now, purchase, guide_id) {
            debug!(code = %normalized, reason = rejected.reason.as_str(), "Redemption refused");
            return Err(rejected.into());
        }

        debug!(code = %normalized, attempt, "Code changed during redemption, retrying");
    }

    Err(RedemptionRejected::new(normalized, RejectionReason::Exhausted).into())
}

// =============================================================================
// Unit Tests
// =============================================================================
