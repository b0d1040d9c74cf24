//! Notification rule engine.
//!
//! Four independent checks scan accounts, transactions and bills against
//! each user's preferences and hand qualifying rows to the notification
//! writer. A run never fails as a whole: each check's error is logged and
//! reported, and the other checks carry on.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared::currency::{format_usd, format_usd_or_tbd};

use super::notification::{DeliveryResult, NotificationChannel};
use super::store::{NotificationStore, StoreError};
use crate::models::notification::{
    LargeTransactionDetails, LowBalanceDetails, RecurringBillDetails, SuspiciousActivityDetails,
};
use crate::models::{
    NewNotification, Notification, NotificationMetadata, NotificationPreferences,
    NotificationPriority, NotificationType, TransactionType,
};

/// A debit is suspicious above this multiple of the category average.
pub const SUSPICIOUS_MULTIPLIER: f64 = 3.0;

/// Bills due within this many days are candidates for a reminder.
pub const BILL_LOOKAHEAD_DAYS: i64 = 3;

/// Lookback for the suspicious-activity check, in hours.
pub const SUSPICIOUS_LOOKBACK_HOURS: i64 = 24;

/// Lookback for the large-transaction check, in minutes.
pub const LARGE_TRANSACTION_LOOKBACK_MINUTES: i64 = 60;

/// Errors raised by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("No test notification for type: {0}")]
    UnsupportedTestType(NotificationType),
}

/// The four rule checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCheck {
    LowBalance,
    SuspiciousActivity,
    RecurringBills,
    LargeTransactions,
}

impl RuleCheck {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCheck::LowBalance => "low_balance",
            RuleCheck::SuspiciousActivity => "suspicious_activity",
            RuleCheck::RecurringBills => "recurring_bills",
            RuleCheck::LargeTransactions => "large_transactions",
        }
    }
}

/// Counters for one check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckSummary {
    /// Rows that met the rule's predicate.
    pub matched: usize,
    /// Notifications written.
    pub created: usize,
    /// Matches suppressed by the dedup window.
    pub deduplicated: usize,
    /// Rows skipped because a per-row lookup or write failed.
    pub row_errors: usize,
}

/// Outcome of one check within a run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutcome {
    pub check: RuleCheck,
    pub succeeded: bool,
    #[serde(flatten)]
    pub summary: CheckSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of [`NotificationEngine::run_checks`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRunReport {
    pub completed_at: DateTime<Utc>,
    pub checks: Vec<CheckOutcome>,
}

impl CheckRunReport {
    pub fn total_created(&self) -> usize {
        self.checks.iter().map(|c| c.summary.created).sum()
    }

    pub fn failed_checks(&self) -> Vec<RuleCheck> {
        self.checks
            .iter()
            .filter(|c| !c.succeeded)
            .map(|c| c.check)
            .collect()
    }

    /// True when every check errored out.
    pub fn all_failed(&self) -> bool {
        !self.checks.is_empty() && self.checks.iter().all(|c| !c.succeeded)
    }

    pub fn outcome(&self, check: RuleCheck) -> Option<&CheckOutcome> {
        self.checks.iter().find(|c| c.check == check)
    }
}

/// Per-check memo of preference lookups; `None` means the user has no row.
type PreferenceCache = HashMap<Uuid, Option<NotificationPreferences>>;

enum WriteOutcome {
    Created,
    Deduplicated,
}

/// Runs rule checks and writes notifications.
#[derive(Clone)]
pub struct NotificationEngine {
    store: Arc<dyn NotificationStore>,
    email: Arc<dyn NotificationChannel>,
}

impl NotificationEngine {
    pub fn new(store: Arc<dyn NotificationStore>, email: Arc<dyn NotificationChannel>) -> Self {
        Self { store, email }
    }

    /// Runs all four checks, optionally scoped to one user.
    pub async fn run_checks(&self, user_id: Option<Uuid>) -> CheckRunReport {
        self.run_checks_at(user_id, Utc::now()).await
    }

    /// Runs all four checks as of `now`.
    ///
    /// Checks run concurrently and each settles on its own.
    pub async fn run_checks_at(&self, user_id: Option<Uuid>, now: DateTime<Utc>) -> CheckRunReport {
        info!(user_id = ?user_id, "Running notification checks");

        let (low_balance, suspicious, bills, large) = tokio::join!(
            self.check_low_balance(user_id, now),
            self.check_suspicious_activity(user_id, now),
            self.check_recurring_bills(user_id, now),
            self.check_large_transactions(user_id, now),
        );

        let checks = vec![
            settle(RuleCheck::LowBalance, low_balance),
            settle(RuleCheck::SuspiciousActivity, suspicious),
            settle(RuleCheck::RecurringBills, bills),
            settle(RuleCheck::LargeTransactions, large),
        ];

        let report = CheckRunReport {
            completed_at: Utc::now(),
            checks,
        };

        info!(
            user_id = ?user_id,
            created = report.total_created(),
            failed_checks = report.failed_checks().len(),
            "Notification checks completed"
        );

        report
    }

    /// Low-balance: active accounts whose balance is under the user's threshold.
    pub async fn check_low_balance(
        &self,
        user_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<CheckSummary, EngineError> {
        let accounts = self.store.find_active_accounts(user_id).await?;
        let mut summary = CheckSummary::default();
        let mut cache = PreferenceCache::new();

        for account in accounts {
            let Some(balance) = account.balance else {
                continue;
            };
            let prefs = match self.preferences(&mut cache, account.user_id).await {
                Ok(Some(prefs)) => prefs,
                Ok(None) => continue,
                Err(e) => {
                    warn!(account_id = %account.id, error = %e, "Preference lookup failed");
                    summary.row_errors += 1;
                    continue;
                }
            };

            if !prefs.low_balance_enabled || balance >= prefs.low_balance_threshold {
                continue;
            }
            summary.matched += 1;

            let notification = NewNotification {
                user_id: account.user_id,
                notification_type: NotificationType::LowBalance,
                title: format!("Low Balance Alert - {}", account.account_name),
                message: format!(
                    "Your {} balance is {}, which is below your threshold of {}.",
                    account.account_name,
                    format_usd(balance),
                    format_usd(prefs.low_balance_threshold)
                ),
                priority: NotificationPriority::High,
                metadata: NotificationMetadata::LowBalance(LowBalanceDetails {
                    account_name: account.account_name.clone(),
                    current_balance: balance,
                    threshold: prefs.low_balance_threshold,
                    institution: account.institution_name.clone(),
                }),
                related_account_id: Some(account.id),
                related_transaction_id: None,
                created_at: now,
            };
            self.write(notification, &mut summary).await;
        }

        Ok(summary)
    }

    /// Suspicious-activity: recent debits far above the category average.
    pub async fn check_suspicious_activity(
        &self,
        user_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<CheckSummary, EngineError> {
        let since = (now - Duration::hours(SUSPICIOUS_LOOKBACK_HOURS)).date_naive();
        let activity = self
            .store
            .find_debit_transactions_since(since, user_id)
            .await?;
        let mut summary = CheckSummary::default();
        let mut cache = PreferenceCache::new();

        for row in activity {
            let tx = &row.transaction;
            let Some(category) = tx.category_primary.as_deref() else {
                continue;
            };

            let pattern = match self.store.find_category_pattern(tx.user_id, category).await {
                Ok(pattern) => pattern,
                Err(e) => {
                    warn!(transaction_id = %tx.id, error = %e, "Pattern lookup failed");
                    summary.row_errors += 1;
                    continue;
                }
            };
            let Some(average) = pattern.as_ref().and_then(|p| p.usable_average()) else {
                debug!(transaction_id = %tx.id, category, "No spending baseline");
                continue;
            };

            let amount = tx.amount.abs();
            if amount <= SUSPICIOUS_MULTIPLIER * average {
                continue;
            }

            let prefs = match self.preferences(&mut cache, tx.user_id).await {
                Ok(Some(prefs)) => prefs,
                Ok(None) => continue,
                Err(e) => {
                    warn!(transaction_id = %tx.id, error = %e, "Preference lookup failed");
                    summary.row_errors += 1;
                    continue;
                }
            };
            if !prefs.suspicious_activity_enabled {
                continue;
            }
            summary.matched += 1;

            let multiplier = amount / average;
            let notification = NewNotification {
                user_id: tx.user_id,
                notification_type: NotificationType::SuspiciousActivity,
                title: "Unusual Spending Detected".to_string(),
                message: format!(
                    "A transaction of {} in {} is {:.1}x your normal spending for this category.",
                    format_usd(amount),
                    category,
                    multiplier
                ),
                priority: NotificationPriority::Urgent,
                metadata: NotificationMetadata::SuspiciousActivity(SuspiciousActivityDetails {
                    transaction_amount: amount,
                    category: Some(category.to_string()),
                    normal_amount: average,
                    multiplier,
                    merchant: tx.merchant_name.clone(),
                    description: Some(tx.description.clone()),
                }),
                related_account_id: Some(tx.account_id),
                related_transaction_id: Some(tx.id),
                created_at: now,
            };
            self.write(notification, &mut summary).await;
        }

        Ok(summary)
    }

    /// Recurring bills: active bills inside the lookahead whose reminder lead
    /// time has been reached.
    pub async fn check_recurring_bills(
        &self,
        user_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<CheckSummary, EngineError> {
        let today = now.date_naive();
        let due_by = today + Duration::days(BILL_LOOKAHEAD_DAYS);
        let bills = self.store.find_bills_due_by(due_by, user_id).await?;
        let mut summary = CheckSummary::default();
        let mut cache = PreferenceCache::new();

        for bill in bills {
            let prefs = match self.preferences(&mut cache, bill.user_id).await {
                Ok(Some(prefs)) => prefs,
                Ok(None) => continue,
                Err(e) => {
                    warn!(bill_id = %bill.id, error = %e, "Preference lookup failed");
                    summary.row_errors += 1;
                    continue;
                }
            };
            if !prefs.recurring_bills_enabled {
                continue;
            }

            let days_until_due = bill.days_until_due(today);
            if days_until_due > i64::from(bill.remind_days_before) {
                continue;
            }
            summary.matched += 1;

            let priority = if days_until_due <= 0 {
                NotificationPriority::Urgent
            } else {
                NotificationPriority::Medium
            };

            let notification = NewNotification {
                user_id: bill.user_id,
                notification_type: NotificationType::RecurringBill,
                title: format!("Bill Reminder - {}", bill.name),
                message: format!(
                    "Your {} bill of {} {}.",
                    bill.name,
                    format_usd_or_tbd(bill.amount),
                    due_phrase(days_until_due)
                ),
                priority,
                metadata: NotificationMetadata::RecurringBill(RecurringBillDetails {
                    bill_id: bill.id,
                    bill_name: bill.name.clone(),
                    amount: bill.amount,
                    due_date: bill.next_due_date,
                    days_until_due,
                    merchant: bill.merchant_name.clone(),
                }),
                related_account_id: None,
                related_transaction_id: None,
                created_at: now,
            };
            self.write(notification, &mut summary).await;
        }

        Ok(summary)
    }

    /// Large transactions: anything imported in the last hour at or above the
    /// user's threshold.
    pub async fn check_large_transactions(
        &self,
        user_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<CheckSummary, EngineError> {
        let since = now - Duration::minutes(LARGE_TRANSACTION_LOOKBACK_MINUTES);
        let activity = self
            .store
            .find_transactions_created_since(since, user_id)
            .await?;
        let mut summary = CheckSummary::default();
        let mut cache = PreferenceCache::new();

        for row in activity {
            let tx = &row.transaction;
            let prefs = match self.preferences(&mut cache, tx.user_id).await {
                Ok(Some(prefs)) => prefs,
                Ok(None) => continue,
                Err(e) => {
                    warn!(transaction_id = %tx.id, error = %e, "Preference lookup failed");
                    summary.row_errors += 1;
                    continue;
                }
            };

            let amount = tx.amount.abs();
            if !prefs.large_transaction_enabled || amount < prefs.large_transaction_threshold {
                continue;
            }
            summary.matched += 1;

            let kind = if tx.transaction_type == TransactionType::Credit {
                "deposit"
            } else {
                "charge"
            };

            let notification = NewNotification {
                user_id: tx.user_id,
                notification_type: NotificationType::LargeTransaction,
                title: "Large Transaction Alert".to_string(),
                message: format!(
                    "A {} of {} was processed on your {}.",
                    kind,
                    format_usd(amount),
                    row.account_name
                ),
                priority: NotificationPriority::Medium,
                metadata: NotificationMetadata::LargeTransaction(LargeTransactionDetails {
                    transaction_amount: amount,
                    transaction_type: tx.transaction_type,
                    account_name: row.account_name.clone(),
                    merchant: tx.merchant_name.clone(),
                    description: Some(tx.description.clone()),
                    threshold: prefs.large_transaction_threshold,
                }),
                related_account_id: Some(tx.account_id),
                related_transaction_id: Some(tx.id),
                created_at: now,
            };
            self.write(notification, &mut summary).await;
        }

        Ok(summary)
    }

    /// Writes a notification and delivers it to the user's enabled channels.
    ///
    /// Returns `None` when a duplicate exists within the type's dedup window.
    /// Delivery is best-effort: the stored row stands whatever the channel
    /// reports.
    pub async fn create_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Option<Notification>, EngineError> {
        let notification_type = notification.notification_type;
        let Some(mut created) = self.store.insert_notification(notification).await? else {
            counter!(
                "notifications_deduplicated_total",
                "type" => notification_type.as_str()
            )
            .increment(1);
            debug!(notification_type = %notification_type, "Duplicate notification suppressed");
            return Ok(None);
        };

        counter!(
            "notifications_created_total",
            "type" => notification_type.as_str()
        )
        .increment(1);
        info!(
            notification_id = %created.id,
            user_id = %created.user_id,
            notification_type = %notification_type,
            priority = %created.priority,
            "Notification created"
        );

        self.deliver_email(&mut created).await;
        Ok(Some(created))
    }

    /// Writes sample notifications through the normal writer.
    ///
    /// With `notification_type` set, writes that one sample; otherwise one of
    /// each rule type.
    pub async fn send_test_notifications(
        &self,
        user_id: Uuid,
        notification_type: Option<NotificationType>,
    ) -> Result<Vec<Notification>, EngineError> {
        let types: Vec<NotificationType> = match notification_type {
            Some(t) if NotificationType::RULE_TYPES.contains(&t) => vec![t],
            Some(t) => return Err(EngineError::UnsupportedTestType(t)),
            None => NotificationType::RULE_TYPES.to_vec(),
        };

        let now = Utc::now();
        let mut created = Vec::with_capacity(types.len());
        for t in types {
            if let Some(n) = self.create_notification(test_notification(user_id, t, now)).await? {
                created.push(n);
            }
        }
        Ok(created)
    }

    async fn write(&self, notification: NewNotification, summary: &mut CheckSummary) {
        match self.create_notification(notification).await {
            Ok(Some(_)) => summary.created += 1,
            Ok(None) => summary.deduplicated += 1,
            Err(e) => {
                warn!(error = %e, "Failed to create notification");
                summary.row_errors += 1;
            }
        }
    }

    async fn preferences(
        &self,
        cache: &mut PreferenceCache,
        user_id: Uuid,
    ) -> Result<Option<NotificationPreferences>, StoreError> {
        if let Some(cached) = cache.get(&user_id) {
            return Ok(cached.clone());
        }
        let prefs = self.store.find_preferences(user_id).await?;
        cache.insert(user_id, prefs.clone());
        Ok(prefs)
    }

    async fn deliver_email(&self, notification: &mut Notification) {
        let prefs = match self.store.find_preferences(notification.user_id).await {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!(notification_id = %notification.id, error = %e, "Preference lookup failed, skipping email");
                return;
            }
        };
        if !prefs.map(|p| p.email_enabled).unwrap_or(false) {
            return;
        }

        let contact = match self.store.find_user_contact(notification.user_id).await {
            Ok(Some(contact)) if contact.email.is_some() => contact,
            Ok(_) => return,
            Err(e) => {
                warn!(notification_id = %notification.id, error = %e, "Contact lookup failed, skipping email");
                return;
            }
        };

        let result = self.email.deliver(&contact, notification).await;
        counter!("notification_emails_total", "result" => result.as_str()).increment(1);

        match result {
            DeliveryResult::Sent => {
                let at = Utc::now();
                let channel = self.email.channel();
                match self
                    .store
                    .mark_channel_sent(notification.id, channel, at)
                    .await
                {
                    Ok(()) => notification.record_delivery(channel, at),
                    Err(e) => warn!(
                        notification_id = %notification.id,
                        error = %e,
                        "Email sent but delivery flag not recorded"
                    ),
                }
            }
            DeliveryResult::Failed(reason) => {
                warn!(notification_id = %notification.id, reason = %reason, "Email delivery failed");
            }
            DeliveryResult::NoRecipient | DeliveryResult::Skipped => {}
        }
    }
}

fn settle(check: RuleCheck, result: Result<CheckSummary, EngineError>) -> CheckOutcome {
    match result {
        Ok(summary) => CheckOutcome {
            check,
            succeeded: true,
            summary,
            error: None,
        },
        Err(e) => {
            counter!("notification_check_failures_total", "check" => check.as_str()).increment(1);
            warn!(check = check.as_str(), error = %e, "Notification check failed");
            CheckOutcome {
                check,
                succeeded: false,
                summary: CheckSummary::default(),
                error: Some(e.to_string()),
            }
        }
    }
}

fn due_phrase(days_until_due: i64) -> String {
    match days_until_due {
        0 => "is due today".to_string(),
        1 => "is due in 1 day".to_string(),
        d if d > 1 => format!("is due in {} days", d),
        -1 => "was due 1 day ago".to_string(),
        d => format!("was due {} days ago", -d),
    }
}

fn test_notification(user_id: Uuid, t: NotificationType, now: DateTime<Utc>) -> NewNotification {
    let (title, message, priority, metadata) = match t {
        NotificationType::LowBalance => (
            "Test: Low Balance Alert",
            "This is a test notification for low balance alerts. Your checking account balance is below your threshold.",
            NotificationPriority::High,
            serde_json::json!({ "test": true, "account_name": "Test Checking", "current_balance": 50, "threshold": 100 }),
        ),
        NotificationType::SuspiciousActivity => (
            "Test: Suspicious Activity Detected",
            "This is a test notification for suspicious activity detection. An unusual transaction was detected.",
            NotificationPriority::Urgent,
            serde_json::json!({ "test": true, "transaction_amount": 500, "category": "Shopping", "multiplier": 5.0 }),
        ),
        NotificationType::LargeTransaction => (
            "Test: Large Transaction Alert",
            "This is a test notification for large transactions. A charge of $750.00 was processed.",
            NotificationPriority::Medium,
            serde_json::json!({ "test": true, "transaction_amount": 750, "account_name": "Test Credit Card" }),
        ),
        _ => (
            "Test: Bill Reminder",
            "This is a test notification for bill reminders. Your electric bill is due in 2 days.",
            NotificationPriority::Medium,
            serde_json::json!({ "test": true, "bill_name": "Electric Bill", "amount": 120, "days_until_due": 2 }),
        ),
    };

    let metadata = match metadata {
        serde_json::Value::Object(map) => NotificationMetadata::Custom(map),
        _ => NotificationMetadata::empty(),
    };

    NewNotification {
        user_id,
        notification_type: t,
        title: title.to_string(),
        message: message.to_string(),
        priority,
        metadata,
        related_account_id: None,
        related_transaction_id: None,
        created_at: now,
    }
}
