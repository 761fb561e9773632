//! # Policy Repository
//!
//! Guide policy snapshots, stored as validated camelCase JSON.
//!
//! Settings are validated on the way in AND on the way out, so a row edited
//! by hand can never reach the pricing engine unchecked.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, warn};
use tourbook_core::PolicySettings;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::PolicyRepository;

#[derive(Debug, Clone)]
pub struct SqlitePolicyRepository {
    pool: SqlitePool,
}

impl SqlitePolicyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SqlitePolicyRepository { pool }
    }

    /// Loads a guide's settings, falling back to the platform default.
    pub async fn load_or_default(&self, guide_id: Uuid) -> DbResult<PolicySettings> {
        Ok(self.load_policy(guide_id).await?.unwrap_or_default())
    }

    /// Number of guides with stored settings.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM guide_policies")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl PolicyRepository for SqlitePolicyRepository {
    async fn load_policy(&self, guide_id: Uuid) -> DbResult<Option<PolicySettings>> {
        debug!(guide_id = %guide_id, "Loading guide policy");

        let json: Option<String> =
            sqlx::query_scalar("SELECT settings_json FROM guide_policies WHERE guide_id = ?1")
                .bind(guide_id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        let Some(json) = json else {
            return Ok(None);
        };

        let settings: PolicySettings = serde_json::from_str(&json).map_err(|e| {
            warn!(guide_id = %guide_id, error = %e, "Stored policy is not valid JSON");
            DbError::invalid_record(format!("policy for guide {}: {}", guide_id, e))
        })?;
        settings.validate()?;

        Ok(Some(settings))
    }

    async fn save_policy(&self, guide_id: Uuid, settings: &PolicySettings) -> DbResult<()> {
        settings.validate()?;

        let json = serde_json::to_string(settings).map_err(|e| DbError::Internal(e.to_string()))?;
        let now = Utc::now().timestamp_millis();

        sqlx::query(
            r#"
            INSERT INTO guide_policies (guide_id, settings_json, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(guide_id) DO UPDATE SET
                settings_json = excluded.settings_json,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(guide_id.to_string())
        .bind(json)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(guide_id = %guide_id, "Saved guide policy");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use tourbook_core::{CancellationPolicy, ConfigurationError, DepositPolicy, Percent};

    async fn repo() -> SqlitePolicyRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().policies()
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let repo = repo().await;
        let guide = Uuid::new_v4();
        let settings = PolicySettings {
            deposit: DepositPolicy::None,
            cancellation: CancellationPolicy::CustomerChoice,
            ..PolicySettings::default()
        };

        repo.save_policy(guide, &settings).await.unwrap();
        assert_eq!(repo.load_policy(guide).await.unwrap(), Some(settings));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_save_replaces_previous_settings() {
        let repo = repo().await;
        let guide = Uuid::new_v4();

        repo.save_policy(guide, &PolicySettings::default()).await.unwrap();
        let updated = PolicySettings {
            deposit: DepositPolicy::Percentage {
                amount_percent: Percent::from_whole(50),
                final_payment_days_before: 30,
            },
            ..PolicySettings::default()
        };
        repo.save_policy(guide, &updated).await.unwrap();

        assert_eq!(repo.load_policy(guide).await.unwrap(), Some(updated));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_guide_falls_back_to_default() {
        let repo = repo().await;
        let guide = Uuid::new_v4();
        assert_eq!(repo.load_policy(guide).await.unwrap(), None);
        assert_eq!(
            repo.load_or_default(guide).await.unwrap(),
            PolicySettings::default()
        );
    }

    #[tokio::test]
    async fn test_invalid_settings_are_not_saved() {
        let repo = repo().await;
        let settings = PolicySettings {
            deposit: DepositPolicy::Percentage {
                amount_percent: Percent::from_whole(80),
                final_payment_days_before: 14,
            },
            ..PolicySettings::default()
        };
        let err = repo.save_policy(Uuid::new_v4(), &settings).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Configuration(ConfigurationError::DepositPercentOutOfRange { .. })
        ));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_tampered_row_is_rejected_on_load() {
        let repo = repo().await;
        let guide = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO guide_policies (guide_id, settings_json, updated_at) VALUES (?1, ?2, 0)",
        )
        .bind(guide.to_string())
        .bind(r#"{ "deposit": { "type": "percentage", "amountPercent": 90, "finalPaymentDaysBefore": 14 } }"#)
        .execute(&repo.pool)
        .await
        .unwrap();

        assert!(matches!(
            repo.load_policy(guide).await,
            Err(DbError::Configuration(_))
        ));

        sqlx::query("UPDATE guide_policies SET settings_json = 'not json' WHERE guide_id = ?1")
            .bind(guide.to_string())
            .execute(&repo.pool)
            .await
            .unwrap();
        assert!(matches!(
            repo.load_policy(guide).await,
            Err(DbError::InvalidRecord(_))
        ));
    }
}
