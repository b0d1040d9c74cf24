//! Per-user notification preferences.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use shared::validation::{
    validate_amount, validate_clock_time, validate_days_ahead, validate_multiplier,
    validate_percent,
};

pub const DEFAULT_LOW_BALANCE_THRESHOLD: f64 = 100.0;
pub const DEFAULT_SUSPICIOUS_MULTIPLIER: f64 = 3.0;
pub const DEFAULT_OVERSPENDING_PERCENT: i32 = 80;
pub const DEFAULT_RECURRING_BILLS_DAYS_AHEAD: i32 = 3;
pub const DEFAULT_LARGE_TRANSACTION_THRESHOLD: f64 = 500.0;

/// Channel toggles, alert toggles and thresholds for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    pub user_id: Uuid,

    pub email_enabled: bool,
    pub push_enabled: bool,
    pub sms_enabled: bool,
    pub in_app_enabled: bool,

    pub low_balance_enabled: bool,
    pub low_balance_threshold: f64,

    pub suspicious_activity_enabled: bool,
    /// Stored for display; the suspicious-activity check uses a fixed 3x.
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

impl NotificationPreferences {
    /// Preferences a user gets on first access.
    pub fn defaults_for(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            email_enabled: true,
            push_enabled: false,
            sms_enabled: false,
            in_app_enabled: true,
            low_balance_enabled: true,
            low_balance_threshold: DEFAULT_LOW_BALANCE_THRESHOLD,
            suspicious_activity_enabled: true,
            suspicious_threshold_multiplier: DEFAULT_SUSPICIOUS_MULTIPLIER,
            overspending_enabled: true,
            overspending_threshold_percent: DEFAULT_OVERSPENDING_PERCENT,
            recurring_bills_enabled: true,
            recurring_bills_days_ahead: DEFAULT_RECURRING_BILLS_DAYS_AHEAD,
            large_transaction_enabled: true,
            large_transaction_threshold: DEFAULT_LARGE_TRANSACTION_THRESHOLD,
            weekly_summary_enabled: true,
            monthly_summary_enabled: false,
            quiet_hours_enabled: false,
            quiet_hours_start: "22:00".to_string(),
            quiet_hours_end: "08:00".to_string(),
            quiet_hours_timezone: "UTC".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a partial update. Fields absent from the request are kept.
    pub fn apply(&mut self, update: &UpdatePreferencesRequest) {
        macro_rules! merge {
            ($($field:ident),* $(,)?) => {
                $(
                    if let Some(value) = &update.$field {
                        self.$field = value.clone();
                    }
                )*
            };
        }

        merge!(
            email_enabled,
            push_enabled,
            sms_enabled,
            in_app_enabled,
            low_balance_enabled,
            low_balance_threshold,
            suspicious_activity_enabled,
            suspicious_threshold_multiplier,
            overspending_enabled,
            overspending_threshold_percent,
            recurring_bills_enabled,
            recurring_bills_days_ahead,
            large_transaction_enabled,
            large_transaction_threshold,
            weekly_summary_enabled,
            monthly_summary_enabled,
            quiet_hours_enabled,
            quiet_hours_start,
            quiet_hours_end,
            quiet_hours_timezone,
        );
        self.updated_at = Utc::now();
    }
}

/// Request payload for updating preferences (partial update).
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePreferencesRequest {
    pub email_enabled: Option<bool>,
    pub push_enabled: Option<bool>,
    pub sms_enabled: Option<bool>,
    pub in_app_enabled: Option<bool>,

    pub low_balance_enabled: Option<bool>,
    #[validate(custom(function = "validate_amount"))]
    pub low_balance_threshold: Option<f64>,

    pub suspicious_activity_enabled: Option<bool>,
    #[validate(custom(function = "validate_multiplier"))]
    pub suspicious_threshold_multiplier: Option<f64>,

    pub overspending_enabled: Option<bool>,
    #[validate(custom(function = "validate_percent"))]
    pub overspending_threshold_percent: Option<i32>,

    pub recurring_bills_enabled: Option<bool>,
    #[validate(custom(function = "validate_days_ahead"))]
    pub recurring_bills_days_ahead: Option<i32>,

    pub large_transaction_enabled: Option<bool>,
    #[validate(custom(function = "validate_amount"))]
    pub large_transaction_threshold: Option<f64>,

    pub weekly_summary_enabled: Option<bool>,
    pub monthly_summary_enabled: Option<bool>,

    pub quiet_hours_enabled: Option<bool>,
    #[validate(custom(function = "validate_clock_time"))]
    pub quiet_hours_start: Option<String>,
    #[validate(custom(function = "validate_clock_time"))]
    pub quiet_hours_end: Option<String>,
    #[validate(length(min = 1, max = 64, message = "Timezone must be 1-64 characters"))]
    pub quiet_hours_timezone: Option<String>,
}

impl UpdatePreferencesRequest {
    pub fn is_empty(&self) -> bool {
        self.email_enabled.is_none()
            && self.push_enabled.is_none()
            && self.sms_enabled.is_none()
            && self.in_app_enabled.is_none()
            && self.low_balance_enabled.is_none()
            && self.low_balance_threshold.is_none()
            && self.suspicious_activity_enabled.is_none()
            && self.suspicious_threshold_multiplier.is_none()
            && self.overspending_enabled.is_none()
            && self.overspending_threshold_percent.is_none()
            && self.recurring_bills_enabled.is_none()
            && self.recurring_bills_days_ahead.is_none()
            && self.large_transaction_enabled.is_none()
            && self.large_transaction_threshold.is_none()
            && self.weekly_summary_enabled.is_none()
            && self.monthly_summary_enabled.is_none()
            && self.quiet_hours_enabled.is_none()
            && self.quiet_hours_start.is_none()
            && self.quiet_hours_end.is_none()
            && self.quiet_hours_timezone.is_none()
    }
}
