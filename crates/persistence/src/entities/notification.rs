//! Notification entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{
    DeliveryChannel, Notification, NotificationMetadata, NotificationPriority, NotificationType,
};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Database row mapping for the notifications table.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    #[sqlx(rename = "type")]
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub priority: String,
    pub urgency_score: i32,
    pub related_account_id: Option<Uuid>,
    pub related_transaction_id: Option<Uuid>,
    pub related_alert_rule_id: Option<Uuid>,
    pub channels_sent: Vec<String>,
    pub email_sent: bool,
    pub email_sent_at: Option<DateTime<Utc>>,
    pub push_sent: bool,
    pub push_sent_at: Option<DateTime<Utc>>,
    pub sms_sent: bool,
    pub sms_sent_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
    pub dismissed_at: Option<DateTime<Utc>>,
    pub action_taken: Option<String>,
    pub metadata: serde_json::Value,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Columns selected for [`NotificationEntity`].
pub const NOTIFICATION_COLUMNS: &str = "id, user_id, type, title, message, priority, urgency_score, \
     related_account_id, related_transaction_id, related_alert_rule_id, channels_sent, \
     email_sent, email_sent_at, push_sent, push_sent_at, sms_sent, sms_sent_at, \
     read_at, dismissed_at, action_taken, metadata, expires_at, created_at";

impl From<NotificationEntity> for Notification {
    fn from(entity: NotificationEntity) -> Self {
        let channels_sent = entity
            .channels_sent
            .iter()
            .filter_map(|c| DeliveryChannel::from_str(c).ok())
            .collect();

        Self {
            id: entity.id,
            user_id: entity.user_id,
            notification_type: NotificationType::from_str(&entity.notification_type)
                .unwrap_or(NotificationType::CustomAlert),
            title: entity.title,
            message: entity.message,
            priority: NotificationPriority::from_str(&entity.priority)
                .unwrap_or(NotificationPriority::Medium),
            urgency_score: entity.urgency_score,
            related_account_id: entity.related_account_id,
            related_transaction_id: entity.related_transaction_id,
            related_alert_rule_id: entity.related_alert_rule_id,
            channels_sent,
            email_sent: entity.email_sent,
            email_sent_at: entity.email_sent_at,
            push_sent: entity.push_sent,
            push_sent_at: entity.push_sent_at,
            sms_sent: entity.sms_sent,
            sms_sent_at: entity.sms_sent_at,
            read_at: entity.read_at,
            dismissed_at: entity.dismissed_at,
            action_taken: entity.action_taken,
            metadata: NotificationMetadata::from_value(entity.metadata),
            expires_at: entity.expires_at,
            created_at: entity.created_at,
        }
    }
}

/// Unread and urgent counts for one user.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationCountsEntity {
    pub unread_count: i64,
    pub urgent_count: i64,
    pub last_notification_at: Option<DateTime<Utc>>,
}
