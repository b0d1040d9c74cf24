//! Notification repository for database operations.

use chrono::{DateTime, Utc};
use domain::models::notification::NotificationSummary;
use domain::models::{DeliveryChannel, NewNotification, Notification};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::entities::{NotificationCountsEntity, NotificationEntity, NOTIFICATION_COLUMNS};
use crate::metrics::QueryTimer;

/// Number of notifications returned in the summary.
pub const SUMMARY_RECENT_LIMIT: i64 = 5;

/// Keyset page request for a user's notifications.
#[derive(Debug, Clone)]
pub struct NotificationPageQuery {
    pub user_id: Uuid,
    /// `(created_at, id)` of the last row on the previous page.
    pub after: Option<(DateTime<Utc>, Uuid)>,
    pub unread_only: bool,
    pub limit: i64,
}

/// Repository for notification database operations.
#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a notification unless one with the same dedup key exists inside
    /// the type's window.
    ///
    /// The window check and insert are one statement. Concurrent writers that
    /// both pass the check collide on the `(user_id, type, dedup_key,
    /// dedup_bucket)` unique index and the loser inserts nothing.
    pub async fn insert_deduplicated(
        &self,
        notification: &NewNotification,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let timer = QueryTimer::new("insert_notification");

        let dedup = notification.dedup_key();
        let dedup_key = dedup.as_ref().map(|d| d.key.clone());
        let dedup_bucket = dedup.as_ref().map(|d| d.bucket(notification.created_at));
        let window_start = dedup
            .as_ref()
            .map(|d| notification.created_at - d.window);

        let sql = format!(
            r#"
            INSERT INTO notifications (
                user_id, type, title, message, priority, urgency_score,
                related_account_id, related_transaction_id, channels_sent,
                metadata, created_at, dedup_key, dedup_bucket
            )
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, ARRAY['in_app'], $9, $10, $11, $12
            WHERE $11::text IS NULL OR NOT EXISTS (
                SELECT 1 FROM notifications
                WHERE user_id = $1
                  AND type = $2
                  AND dedup_key = $11
                  AND created_at >= $13::timestamptz
            )
            ON CONFLICT DO NOTHING
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        );

        let entity = sqlx::query_as::<_, NotificationEntity>(&sql)
            .bind(notification.user_id)
            .bind(notification.notification_type.as_str())
            .bind(&notification.title)
            .bind(&notification.message)
            .bind(notification.priority.as_str())
            .bind(notification.priority.urgency_score())
            .bind(notification.related_account_id)
            .bind(notification.related_transaction_id)
            .bind(notification.metadata.to_value())
            .bind(notification.created_at)
            .bind(&dedup_key)
            .bind(dedup_bucket)
            .bind(window_start)
            .fetch_optional(&self.pool)
            .await?;

        timer.record();
        if entity.is_none() {
            debug!(
                user_id = %notification.user_id,
                notification_type = notification.notification_type.as_str(),
                dedup_key = dedup_key.as_deref().unwrap_or_default(),
                "Notification suppressed by dedup window"
            );
        }
        Ok(entity.map(Into::into))
    }

    /// Sets the sent flag and timestamp for a channel and appends it to
    /// `channels_sent` once.
    pub async fn mark_channel_sent(
        &self,
        id: Uuid,
        channel: DeliveryChannel,
        at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("mark_notification_channel_sent");
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET email_sent = email_sent OR $2 = 'email',
                email_sent_at = CASE WHEN $2 = 'email' THEN $3 ELSE email_sent_at END,
                push_sent = push_sent OR $2 = 'push',
                push_sent_at = CASE WHEN $2 = 'push' THEN $3 ELSE push_sent_at END,
                sms_sent = sms_sent OR $2 = 'sms',
                sms_sent_at = CASE WHEN $2 = 'sms' THEN $3 ELSE sms_sent_at END,
                channels_sent = CASE
                    WHEN $2 = ANY(channels_sent) THEN channels_sent
                    ELSE array_append(channels_sent, $2)
                END
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(channel.as_str())
        .bind(at)
        .execute(&self.pool)
        .await?;

        timer.record();
        Ok(result.rows_affected() > 0)
    }

    /// Returns one page, newest first, and whether more rows follow.
    pub async fn list_for_user(
        &self,
        query: NotificationPageQuery,
    ) -> Result<(Vec<Notification>, bool), sqlx::Error> {
        let timer = QueryTimer::new("list_notifications");

        // Fetch limit + 1 to determine if more results exist
        let fetch_limit = query.limit + 1;
        let (cursor_ts, cursor_id) = match query.after {
            Some((ts, id)) => (Some(ts), Some(id)),
            None => (None, None),
        };

        let sql = format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            WHERE user_id = $1
              AND ($2 = FALSE OR (read_at IS NULL AND dismissed_at IS NULL))
              AND (expires_at IS NULL OR expires_at > NOW())
              AND ($3::timestamptz IS NULL OR (created_at, id) < ($3, $4))
            ORDER BY created_at DESC, id DESC
            LIMIT $5
            "#
        );

        let rows = sqlx::query_as::<_, NotificationEntity>(&sql)
            .bind(query.user_id)
            .bind(query.unread_only)
            .bind(cursor_ts)
            // Max UUID keeps the row comparison valid when only a timestamp is known
            .bind(cursor_id.unwrap_or_else(|| Uuid::from_bytes([0xff; 16])))
            .bind(fetch_limit)
            .fetch_all(&self.pool)
            .await?;

        timer.record();

        let has_more = rows.len() as i64 > query.limit;
        let mut rows = rows;
        if has_more {
            rows.pop();
        }

        Ok((rows.into_iter().map(Into::into).collect(), has_more))
    }

    /// Unread and urgent counts plus the most recent notifications.
    pub async fn summary(&self, user_id: Uuid) -> Result<NotificationSummary, sqlx::Error> {
        let timer = QueryTimer::new("notification_summary");

        let counts = sqlx::query_as::<_, NotificationCountsEntity>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE read_at IS NULL AND dismissed_at IS NULL) AS unread_count,
                COUNT(*) FILTER (
                    WHERE read_at IS NULL AND dismissed_at IS NULL AND priority = 'urgent'
                ) AS urgent_count,
                MAX(created_at) AS last_notification_at
            FROM notifications
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            WHERE user_id = $1 AND dismissed_at IS NULL
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#
        );
        let recent = sqlx::query_as::<_, NotificationEntity>(&sql)
            .bind(user_id)
            .bind(SUMMARY_RECENT_LIMIT)
            .fetch_all(&self.pool)
            .await?;

        timer.record();

        Ok(NotificationSummary {
            unread_count: counts.unread_count,
            urgent_count: counts.urgent_count,
            recent_notifications: recent.into_iter().map(Into::into).collect(),
            last_notification_at: counts.last_notification_at,
        })
    }

    /// Marks one of the user's notifications as read. Idempotent.
    pub async fn mark_read(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let timer = QueryTimer::new("mark_notification_read");
        let sql = format!(
            r#"
            UPDATE notifications
            SET read_at = COALESCE(read_at, NOW()),
                action_taken = COALESCE(action_taken, 'viewed')
            WHERE id = $1 AND user_id = $2
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        );
        let entity = sqlx::query_as::<_, NotificationEntity>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        timer.record();
        Ok(entity.map(Into::into))
    }

    /// Dismisses one of the user's notifications, marking it read as well.
    pub async fn dismiss(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let timer = QueryTimer::new("dismiss_notification");
        let sql = format!(
            r#"
            UPDATE notifications
            SET dismissed_at = COALESCE(dismissed_at, NOW()),
                read_at = COALESCE(read_at, NOW()),
                action_taken = 'dismissed'
            WHERE id = $1 AND user_id = $2
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        );
        let entity = sqlx::query_as::<_, NotificationEntity>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        timer.record();
        Ok(entity.map(Into::into))
    }

    /// Marks every unread notification of the user as read.
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("mark_all_notifications_read");
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET read_at = NOW(),
                action_taken = COALESCE(action_taken, 'viewed')
            WHERE user_id = $1 AND read_at IS NULL
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        timer.record();
        Ok(result.rows_affected())
    }
}
