//! Notification preferences repository.
//!
//! Preferences are created lazily with column defaults on first access and
//! never deleted.

use domain::models::{NotificationPreferences, UpdatePreferencesRequest};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::entities::NotificationPreferencesEntity;
use crate::metrics::QueryTimer;

const PREFERENCE_COLUMNS: &str = "user_id, email_enabled, push_enabled, sms_enabled, in_app_enabled, \
     low_balance_enabled, low_balance_threshold, suspicious_activity_enabled, \
     suspicious_threshold_multiplier, overspending_enabled, overspending_threshold_percent, \
     recurring_bills_enabled, recurring_bills_days_ahead, large_transaction_enabled, \
     large_transaction_threshold, weekly_summary_enabled, monthly_summary_enabled, \
     quiet_hours_enabled, quiet_hours_start, quiet_hours_end, quiet_hours_timezone, \
     created_at, updated_at";

/// Repository for notification preference operations.
#[derive(Clone)]
pub struct NotificationPreferencesRepository {
    pool: PgPool,
}

impl NotificationPreferencesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Preferences for a user, without creating them.
    pub async fn find(&self, user_id: Uuid) -> Result<Option<NotificationPreferences>, sqlx::Error> {
        let timer = QueryTimer::new("find_notification_preferences");
        let sql = format!(
            "SELECT {PREFERENCE_COLUMNS} FROM notification_preferences WHERE user_id = $1"
        );
        let entity = sqlx::query_as::<_, NotificationPreferencesEntity>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        timer.record();
        Ok(entity.map(Into::into))
    }

    /// Preferences for a user, inserting the defaults first if none exist.
    pub async fn get_or_create(
        &self,
        user_id: Uuid,
    ) -> Result<NotificationPreferences, sqlx::Error> {
        let timer = QueryTimer::new("get_or_create_notification_preferences");

        sqlx::query(
            r#"
            INSERT INTO notification_preferences (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        let sql = format!(
            "SELECT {PREFERENCE_COLUMNS} FROM notification_preferences WHERE user_id = $1"
        );
        let entity = sqlx::query_as::<_, NotificationPreferencesEntity>(&sql)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        timer.record();
        Ok(entity.into())
    }

    /// Applies a partial update under a row lock and returns the result.
    pub async fn update(
        &self,
        user_id: Uuid,
        update: &UpdatePreferencesRequest,
    ) -> Result<NotificationPreferences, sqlx::Error> {
        let timer = QueryTimer::new("update_notification_preferences");
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO notification_preferences (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let sql = format!(
            "SELECT {PREFERENCE_COLUMNS} FROM notification_preferences WHERE user_id = $1 FOR UPDATE"
        );
        let current: NotificationPreferences =
            sqlx::query_as::<_, NotificationPreferencesEntity>(&sql)
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?
                .into();

        let mut prefs = current;
        prefs.apply(update);

        let sql = format!(
            r#"
            UPDATE notification_preferences
            SET email_enabled = $2,
                push_enabled = $3,
                sms_enabled = $4,
                in_app_enabled = $5,
                low_balance_enabled = $6,
                low_balance_threshold = $7,
                suspicious_activity_enabled = $8,
                suspicious_threshold_multiplier = $9,
                overspending_enabled = $10,
                overspending_threshold_percent = $11,
                recurring_bills_enabled = $12,
                recurring_bills_days_ahead = $13,
                large_transaction_enabled = $14,
                large_transaction_threshold = $15,
                weekly_summary_enabled = $16,
                monthly_summary_enabled = $17,
                quiet_hours_enabled = $18,
                quiet_hours_start = $19,
                quiet_hours_end = $20,
                quiet_hours_timezone = $21,
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING {PREFERENCE_COLUMNS}
            "#
        );
        let entity = sqlx::query_as::<_, NotificationPreferencesEntity>(&sql)
            .bind(user_id)
            .bind(prefs.email_enabled)
            .bind(prefs.push_enabled)
            .bind(prefs.sms_enabled)
            .bind(prefs.in_app_enabled)
            .bind(prefs.low_balance_enabled)
            .bind(prefs.low_balance_threshold)
            .bind(prefs.suspicious_activity_enabled)
            .bind(prefs.suspicious_threshold_multiplier)
            .bind(prefs.overspending_enabled)
            .bind(prefs.overspending_threshold_percent)
            .bind(prefs.recurring_bills_enabled)
            .bind(prefs.recurring_bills_days_ahead)
            .bind(prefs.large_transaction_enabled)
            .bind(prefs.large_transaction_threshold)
            .bind(prefs.weekly_summary_enabled)
            .bind(prefs.monthly_summary_enabled)
            .bind(prefs.quiet_hours_enabled)
            .bind(&prefs.quiet_hours_start)
            .bind(&prefs.quiet_hours_end)
            .bind(&prefs.quiet_hours_timezone)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        timer.record();
        debug!(user_id = %user_id, "Notification preferences updated under row lock");
        Ok(entity.into())
    }
}
