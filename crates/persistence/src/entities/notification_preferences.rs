//! Notification preferences entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::NotificationPreferences;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the notification_preferences table.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationPreferencesEntity {
    pub user_id: Uuid,
    pub email_enabled: bool,
    pub push_enabled: bool,
    pub sms_enabled: bool,
    pub in_app_enabled: bool,
    pub low_balance_enabled: bool,
    pub low_balance_threshold: f64,
    pub suspicious_activity_enabled: bool,
    pub suspicious_threshold_multiplier: f64,
    pub overspending_enabled: bool,
    pub overspending_threshold_percent: i32,
    pub recurring_bills_enabled: bool,
    pub recurring_bills_days_ahead: i32,
    pub large_transaction_enabled: bool,
    pub large_transaction_threshold: f64,
    pub weekly_summary_enabled: bool,
    pub monthly_summary_enabled: bool,
    pub quiet_hours_enabled: bool,
    pub quiet_hours_start: String,
    pub quiet_hours_end: String,
    pub quiet_hours_timezone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<NotificationPreferencesEntity> for NotificationPreferences {
    fn from(e: NotificationPreferencesEntity) -> Self {
        Self {
            user_id: e.user_id,
            email_enabled: e.email_enabled,
            push_enabled: e.push_enabled,
            sms_enabled: e.sms_enabled,
            in_app_enabled: e.in_app_enabled,
            low_balance_enabled: e.low_balance_enabled,
            low_balance_threshold: e.low_balance_threshold,
            suspicious_activity_enabled: e.suspicious_activity_enabled,
            suspicious_threshold_multiplier: e.suspicious_threshold_multiplier,
            overspending_enabled: e.overspending_enabled,
            overspending_threshold_percent: e.overspending_threshold_percent,
            recurring_bills_enabled: e.recurring_bills_enabled,
            recurring_bills_days_ahead: e.recurring_bills_days_ahead,
            large_transaction_enabled: e.large_transaction_enabled,
            large_transaction_threshold: e.large_transaction_threshold,
            weekly_summary_enabled: e.weekly_summary_enabled,
            monthly_summary_enabled: e.monthly_summary_enabled,
            quiet_hours_enabled: e.quiet_hours_enabled,
            quiet_hours_start: e.quiet_hours_start,
            quiet_hours_end: e.quiet_hours_end,
            quiet_hours_timezone: e.quiet_hours_timezone,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}
