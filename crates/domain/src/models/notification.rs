//! Notification domain model.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::account::TransactionType;

// ============================================================================
// Enums
// ============================================================================

/// Kind of notification emitted by the rule engine or other producers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    LowBalance,
    SuspiciousActivity,
    Overspending,
    RecurringBill,
    LargeTransaction,
    CustomAlert,
    WeeklySummary,
    MonthlySummary,
    SecurityAlert,
}

impl NotificationType {
    /// The four types produced by rule checks.
    pub const RULE_TYPES: [NotificationType; 4] = [
        NotificationType::LowBalance,
        NotificationType::SuspiciousActivity,
        NotificationType::LargeTransaction,
        NotificationType::RecurringBill,
    ];

    /// Returns the string representation for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::LowBalance => "low_balance",
            NotificationType::SuspiciousActivity => "suspicious_activity",
            NotificationType::Overspending => "overspending",
            NotificationType::RecurringBill => "recurring_bill",
            NotificationType::LargeTransaction => "large_transaction",
            NotificationType::CustomAlert => "custom_alert",
            NotificationType::WeeklySummary => "weekly_summary",
            NotificationType::MonthlySummary => "monthly_summary",
            NotificationType::SecurityAlert => "security_alert",
        }
    }

    /// Trailing window within which a second notification for the same
    /// related entity is suppressed. `None` means no suppression.
    pub fn dedup_window(&self) -> Option<Duration> {
        match self {
            NotificationType::LowBalance => Some(Duration::hours(24)),
            NotificationType::RecurringBill
            | NotificationType::SuspiciousActivity
            | NotificationType::LargeTransaction => Some(Duration::days(7)),
            _ => None,
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low_balance" => Ok(NotificationType::LowBalance),
            "suspicious_activity" => Ok(NotificationType::SuspiciousActivity),
            "overspending" => Ok(NotificationType::Overspending),
            "recurring_bill" => Ok(NotificationType::RecurringBill),
            "large_transaction" => Ok(NotificationType::LargeTransaction),
            "custom_alert" => Ok(NotificationType::CustomAlert),
            "weekly_summary" => Ok(NotificationType::WeeklySummary),
            "monthly_summary" => Ok(NotificationType::MonthlySummary),
            "security_alert" => Ok(NotificationType::SecurityAlert),
            _ => Err(format!("Invalid notification type: {}", s)),
        }
    }
}

/// Notification priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl NotificationPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationPriority::Low => "low",
            NotificationPriority::Medium => "medium",
            NotificationPriority::High => "high",
            NotificationPriority::Urgent => "urgent",
        }
    }

    /// Numeric urgency used for sorting in clients.
    pub fn urgency_score(&self) -> i32 {
        match self {
            NotificationPriority::Urgent => 90,
            NotificationPriority::High => 70,
            _ => 50,
        }
    }
}

impl fmt::Display for NotificationPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for NotificationPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(NotificationPriority::Low),
            "medium" => Ok(NotificationPriority::Medium),
            "high" => Ok(NotificationPriority::High),
            "urgent" => Ok(NotificationPriority::Urgent),
            _ => Err(format!("Invalid notification priority: {}", s)),
        }
    }
}

/// Delivery channel a notification has been sent through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryChannel {
    InApp,
    Email,
    Push,
    Sms,
}

impl DeliveryChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryChannel::InApp => "in_app",
            DeliveryChannel::Email => "email",
            DeliveryChannel::Push => "push",
            DeliveryChannel::Sms => "sms",
        }
    }
}

impl fmt::Display for DeliveryChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DeliveryChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_app" => Ok(DeliveryChannel::InApp),
            "email" => Ok(DeliveryChannel::Email),
            "push" => Ok(DeliveryChannel::Push),
            "sms" => Ok(DeliveryChannel::Sms),
            _ => Err(format!("Invalid delivery channel: {}", s)),
        }
    }
}

/// User action recorded on a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationAction {
    Viewed,
    Dismissed,
}

impl NotificationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationAction::Viewed => "viewed",
            NotificationAction::Dismissed => "dismissed",
        }
    }
}

// ============================================================================
// Metadata
// ============================================================================

/// Low-balance alert details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowBalanceDetails {
    pub account_name: String,
    pub current_balance: f64,
    pub threshold: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
}

/// Suspicious-activity alert details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspiciousActivityDetails {
    pub transaction_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub normal_amount: f64,
    pub multiplier: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Recurring-bill reminder details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringBillDetails {
    pub bill_id: Uuid,
    pub bill_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    pub due_date: NaiveDate,
    pub days_until_due: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,
}

/// Large-transaction alert details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LargeTransactionDetails {
    pub transaction_amount: f64,
    pub transaction_type: TransactionType,
    pub account_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub threshold: f64,
}

/// Structured metadata attached to a notification, one variant per rule type.
///
/// Stored as JSONB with a `kind` discriminator. Notifications not produced
/// by a rule check carry an open `Custom` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationMetadata {
    LowBalance(LowBalanceDetails),
    SuspiciousActivity(SuspiciousActivityDetails),
    RecurringBill(RecurringBillDetails),
    LargeTransaction(LargeTransactionDetails),
    Custom(serde_json::Map<String, serde_json::Value>),
}

impl NotificationMetadata {
    /// Empty custom metadata.
    pub fn empty() -> Self {
        NotificationMetadata::Custom(serde_json::Map::new())
    }

    /// Bill id for recurring-bill metadata.
    pub fn bill_id(&self) -> Option<Uuid> {
        match self {
            NotificationMetadata::RecurringBill(d) => Some(d.bill_id),
            _ => None,
        }
    }

    /// Multiplier for suspicious-activity metadata.
    pub fn multiplier(&self) -> Option<f64> {
        match self {
            NotificationMetadata::SuspiciousActivity(d) => Some(d.multiplier),
            _ => None,
        }
    }

    /// Converts to a JSON value for storage or templating.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({ "kind": "custom" }))
    }

    /// Parses stored JSON; unknown shapes fall back to `Custom`.
    pub fn from_value(value: serde_json::Value) -> Self {
        match serde_json::from_value::<NotificationMetadata>(value.clone()) {
            Ok(metadata) => metadata,
            Err(_) => match value {
                serde_json::Value::Object(mut map) => {
                    map.remove("kind");
                    NotificationMetadata::Custom(map)
                }
                _ => NotificationMetadata::empty(),
            },
        }
    }
}

impl Default for NotificationMetadata {
    fn default() -> Self {
        Self::empty()
    }
}

// ============================================================================
// Core Model
// ============================================================================

/// A persisted notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    pub urgency_score: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_account_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_transaction_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_alert_rule_id: Option<Uuid>,
    pub channels_sent: Vec<DeliveryChannel>,
    pub email_sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_sent_at: Option<DateTime<Utc>>,
    pub push_sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_sent_at: Option<DateTime<Utc>>,
    pub sms_sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sms_sent_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dismissed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_taken: Option<String>,
    pub metadata: NotificationMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_unread(&self) -> bool {
        self.read_at.is_none() && self.dismissed_at.is_none()
    }

    /// Marks delivery through a channel, keeping `channels_sent` free of duplicates.
    pub fn record_delivery(&mut self, channel: DeliveryChannel, at: DateTime<Utc>) {
        match channel {
            DeliveryChannel::Email => {
                self.email_sent = true;
                self.email_sent_at = Some(at);
            }
            DeliveryChannel::Push => {
                self.push_sent = true;
                self.push_sent_at = Some(at);
            }
            DeliveryChannel::Sms => {
                self.sms_sent = true;
                self.sms_sent_at = Some(at);
            }
            DeliveryChannel::InApp => {}
        }
        if !self.channels_sent.contains(&channel) {
            self.channels_sent.push(channel);
        }
    }
}

/// Input to the notification writer.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    pub metadata: NotificationMetadata,
    pub related_account_id: Option<Uuid>,
    pub related_transaction_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Identity of a notification for duplicate suppression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupKey {
    pub key: String,
    pub window: Duration,
}

impl DedupKey {
    /// Fixed-width time bucket the key falls into at `at`.
    pub fn bucket(&self, at: DateTime<Utc>) -> i64 {
        let window_secs = self.window.num_seconds().max(1);
        at.timestamp().div_euclid(window_secs)
    }
}

impl NewNotification {
    /// Entity the notification is about, for types that are deduplicated.
    ///
    /// Low-balance keys on the account, recurring-bill on the bill, and the
    /// transaction checks on the transaction.
    pub fn dedup_key(&self) -> Option<DedupKey> {
        let window = self.notification_type.dedup_window()?;
        let entity = match self.notification_type {
            NotificationType::LowBalance => self.related_account_id,
            NotificationType::RecurringBill => self.metadata.bill_id(),
            NotificationType::SuspiciousActivity | NotificationType::LargeTransaction => {
                self.related_transaction_id
            }
            _ => None,
        }?;
        Some(DedupKey {
            key: entity.to_string(),
            window,
        })
    }

    /// Materializes the row as inserted: in-app only, nothing else sent.
    pub fn into_notification(self, id: Uuid) -> Notification {
        Notification {
            id,
            user_id: self.user_id,
            notification_type: self.notification_type,
            title: self.title,
            message: self.message,
            urgency_score: self.priority.urgency_score(),
            priority: self.priority,
            related_account_id: self.related_account_id,
            related_transaction_id: self.related_transaction_id,
            related_alert_rule_id: None,
            channels_sent: vec![DeliveryChannel::InApp],
            email_sent: false,
            email_sent_at: None,
            push_sent: false,
            push_sent_at: None,
            sms_sent: false,
            sms_sent_at: None,
            read_at: None,
            dismissed_at: None,
            action_taken: None,
            metadata: self.metadata,
            expires_at: None,
            created_at: self.created_at,
        }
    }
}

// ============================================================================
// API types
// ============================================================================

/// Query parameters for listing notifications.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsQuery {
    /// Opaque cursor (base64 of created_at|id).
    pub cursor: Option<String>,
    /// Page size (1-100, default 20).
    pub limit: Option<i64>,
    /// Only notifications that are neither read nor dismissed.
    #[serde(default)]
    pub unread_only: bool,
}

impl ListNotificationsQuery {
    pub const DEFAULT_LIMIT: i64 = 20;
    pub const MAX_LIMIT: i64 = 100;
    pub const MIN_LIMIT: i64 = 1;

    /// Returns the effective limit, clamped to valid range.
    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(Self::MIN_LIMIT, Self::MAX_LIMIT)
    }
}

/// Pagination info for cursor-based pagination.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

/// A page of notifications.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsResponse {
    pub notifications: Vec<Notification>,
    pub pagination: PaginationInfo,
}

/// Aggregate counts for the notification bell.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSummary {
    pub unread_count: i64,
    pub urgent_count: i64,
    pub recent_notifications: Vec<Notification>,
    pub last_notification_at: Option<DateTime<Utc>>,
}

/// Result of a bulk mark-as-read.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn new_low_balance(account_id: Uuid) -> NewNotification {
        NewNotification {
            user_id: Uuid::new_v4(),
            notification_type: NotificationType::LowBalance,
            title: "Low Balance Alert - Checking".to_string(),
            message: "msg".to_string(),
            priority: NotificationPriority::High,
            metadata: NotificationMetadata::LowBalance(LowBalanceDetails {
                account_name: "Checking".to_string(),
                current_balance: 50.0,
                threshold: 100.0,
                institution: None,
            }),
            related_account_id: Some(account_id),
            related_transaction_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_notification_type_round_trip_strings() {
        for t in [
            NotificationType::LowBalance,
            NotificationType::SuspiciousActivity,
            NotificationType::Overspending,
            NotificationType::RecurringBill,
            NotificationType::LargeTransaction,
            NotificationType::CustomAlert,
            NotificationType::WeeklySummary,
            NotificationType::MonthlySummary,
            NotificationType::SecurityAlert,
        ] {
            assert_eq!(NotificationType::from_str(t.as_str()).unwrap(), t);
        }
        assert!(NotificationType::from_str("bogus").is_err());
    }

    #[test]
    fn test_urgency_scores() {
        assert_eq!(NotificationPriority::Urgent.urgency_score(), 90);
        assert_eq!(NotificationPriority::High.urgency_score(), 70);
        assert_eq!(NotificationPriority::Medium.urgency_score(), 50);
        assert_eq!(NotificationPriority::Low.urgency_score(), 50);
    }

    #[test]
    fn test_dedup_windows() {
        assert_eq!(
            NotificationType::LowBalance.dedup_window(),
            Some(Duration::hours(24))
        );
        assert_eq!(
            NotificationType::RecurringBill.dedup_window(),
            Some(Duration::days(7))
        );
        assert_eq!(NotificationType::SecurityAlert.dedup_window(), None);
    }

    #[test]
    fn test_dedup_key_low_balance_uses_account() {
        let account_id = Uuid::new_v4();
        let key = new_low_balance(account_id).dedup_key().unwrap();
        assert_eq!(key.key, account_id.to_string());
        assert_eq!(key.window, Duration::hours(24));
    }

    #[test]
    fn test_dedup_key_recurring_bill_uses_bill_id() {
        let bill_id = Uuid::new_v4();
        let mut n = new_low_balance(Uuid::new_v4());
        n.notification_type = NotificationType::RecurringBill;
        n.related_account_id = None;
        n.metadata = NotificationMetadata::RecurringBill(RecurringBillDetails {
            bill_id,
            bill_name: "Rent".to_string(),
            amount: Some(1200.0),
            due_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            days_until_due: 2,
            merchant: None,
        });
        assert_eq!(n.dedup_key().unwrap().key, bill_id.to_string());
    }

    #[test]
    fn test_dedup_key_absent_for_untracked_types() {
        let mut n = new_low_balance(Uuid::new_v4());
        n.notification_type = NotificationType::CustomAlert;
        assert!(n.dedup_key().is_none());
    }

    #[test]
    fn test_dedup_key_absent_without_entity() {
        let mut n = new_low_balance(Uuid::new_v4());
        n.related_account_id = None;
        assert!(n.dedup_key().is_none());
    }

    #[test]
    fn test_bucket_is_stable_within_window() {
        let key = DedupKey {
            key: "x".to_string(),
            window: Duration::hours(24),
        };
        let a = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 1).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 6, 15, 23, 59, 59).unwrap();
        let c = Utc.with_ymd_and_hms(2024, 6, 16, 0, 0, 1).unwrap();
        assert_eq!(key.bucket(a), key.bucket(b));
        assert_ne!(key.bucket(a), key.bucket(c));
    }

    #[test]
    fn test_metadata_serializes_with_kind_tag() {
        let metadata = NotificationMetadata::SuspiciousActivity(SuspiciousActivityDetails {
            transaction_amount: 500.0,
            category: Some("Shopping".to_string()),
            normal_amount: 50.0,
            multiplier: 10.0,
            merchant: None,
            description: None,
        });
        let value = metadata.to_value();
        assert_eq!(value["kind"], "suspicious_activity");
        assert_eq!(value["multiplier"], 10.0);
        assert!(value.get("merchant").is_none());

        assert_eq!(NotificationMetadata::from_value(value), metadata);
    }

    #[test]
    fn test_metadata_from_untagged_value_is_custom() {
        let value = serde_json::json!({ "test": true, "amount": 120 });
        match NotificationMetadata::from_value(value) {
            NotificationMetadata::Custom(map) => {
                assert_eq!(map.get("test"), Some(&serde_json::json!(true)));
            }
            other => panic!("expected custom metadata, got {:?}", other),
        }
    }

    #[test]
    fn test_metadata_from_non_object_is_empty() {
        assert_eq!(
            NotificationMetadata::from_value(serde_json::json!(null)),
            NotificationMetadata::empty()
        );
    }

    #[test]
    fn test_into_notification_starts_in_app_only() {
        let n = new_low_balance(Uuid::new_v4()).into_notification(Uuid::new_v4());
        assert_eq!(n.channels_sent, vec![DeliveryChannel::InApp]);
        assert_eq!(n.urgency_score, 70);
        assert!(!n.email_sent);
        assert!(n.is_unread());
    }

    #[test]
    fn test_record_delivery_appends_once() {
        let mut n = new_low_balance(Uuid::new_v4()).into_notification(Uuid::new_v4());
        let at = Utc::now();
        n.record_delivery(DeliveryChannel::Email, at);
        n.record_delivery(DeliveryChannel::Email, at);
        assert_eq!(
            n.channels_sent,
            vec![DeliveryChannel::InApp, DeliveryChannel::Email]
        );
        assert!(n.email_sent);
        assert_eq!(n.email_sent_at, Some(at));
    }

    #[test]
    fn test_notification_serializes_type_field() {
        let n = new_low_balance(Uuid::new_v4()).into_notification(Uuid::new_v4());
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "low_balance");
        assert_eq!(json["priority"], "high");
        assert_eq!(json["channelsSent"], serde_json::json!(["in_app"]));
    }

    #[test]
    fn test_list_query_effective_limit() {
        let mut q = ListNotificationsQuery::default();
        assert_eq!(q.effective_limit(), 20);
        q.limit = Some(500);
        assert_eq!(q.effective_limit(), 100);
        q.limit = Some(0);
        assert_eq!(q.effective_limit(), 1);
    }
}
