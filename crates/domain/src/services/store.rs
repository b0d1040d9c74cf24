//! Read/write interface the rule engine runs against.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::spending_pattern::CATEGORY_AVERAGE;
use crate::models::{
    ConnectedAccount, DeliveryChannel, NewNotification, Notification, NotificationPreferences,
    RecurringBill, SpendingPattern, TransactionActivity, TransactionType, UserContact,
};

/// Errors surfaced by a notification store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

/// Candidate queries, preference lookups and the notification writer's
/// persistence, optionally scoped to a single user.
#[async_trait::async_trait]
pub trait NotificationStore: Send + Sync {
    /// Active accounts with a known balance.
    async fn find_active_accounts(
        &self,
        user_id: Option<Uuid>,
    ) -> Result<Vec<ConnectedAccount>, StoreError>;

    /// Debit transactions dated on or after `since`.
    async fn find_debit_transactions_since(
        &self,
        since: NaiveDate,
        user_id: Option<Uuid>,
    ) -> Result<Vec<TransactionActivity>, StoreError>;

    /// Transactions imported at or after `since`.
    async fn find_transactions_created_since(
        &self,
        since: DateTime<Utc>,
        user_id: Option<Uuid>,
    ) -> Result<Vec<TransactionActivity>, StoreError>;

    /// Active bills with `next_due_date <= due_by`.
    async fn find_bills_due_by(
        &self,
        due_by: NaiveDate,
        user_id: Option<Uuid>,
    ) -> Result<Vec<RecurringBill>, StoreError>;

    /// The `category_average` pattern for a user's category.
    async fn find_category_pattern(
        &self,
        user_id: Uuid,
        category: &str,
    ) -> Result<Option<SpendingPattern>, StoreError>;

    async fn find_preferences(
        &self,
        user_id: Uuid,
    ) -> Result<Option<NotificationPreferences>, StoreError>;

    async fn find_user_contact(&self, user_id: Uuid) -> Result<Option<UserContact>, StoreError>;

    /// Inserts a notification unless a duplicate exists within its dedup
    /// window. Returns `None` when suppressed. Check and insert are atomic.
    async fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Option<Notification>, StoreError>;

    /// Records delivery through `channel`.
    async fn mark_channel_sent(
        &self,
        notification_id: Uuid,
        channel: DeliveryChannel,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

/// Store operations, used to inject failures into [`InMemoryNotificationStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    ActiveAccounts,
    DebitTransactions,
    RecentTransactions,
    BillsDue,
    CategoryPattern,
    Preferences,
    UserContact,
    InsertNotification,
    MarkChannelSent,
}

#[derive(Default)]
struct InMemoryState {
    accounts: Vec<ConnectedAccount>,
    transactions: Vec<TransactionActivity>,
    bills: Vec<RecurringBill>,
    patterns: Vec<SpendingPattern>,
    preferences: HashMap<Uuid, NotificationPreferences>,
    contacts: HashMap<Uuid, UserContact>,
    notifications: Vec<StoredNotification>,
    failing: HashSet<StoreOperation>,
}

struct StoredNotification {
    dedup_key: Option<String>,
    notification: Notification,
}

/// In-process store for development and tests.
///
/// Dedup runs under the same lock as the insert, matching the single
/// conditional statement used by the Postgres store.
#[derive(Default)]
pub struct InMemoryNotificationStore {
    state: Mutex<InMemoryState>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut InMemoryState) -> T) -> T {
        let mut guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }

    fn check(&self, op: StoreOperation) -> Result<(), StoreError> {
        if self.with_state(|s| s.failing.contains(&op)) {
            return Err(StoreError::Database(format!("simulated failure in {:?}", op)));
        }
        Ok(())
    }

    /// Makes every subsequent call of `op` fail.
    pub fn fail_on(&self, op: StoreOperation) {
        self.with_state(|s| {
            s.failing.insert(op);
        });
    }

    pub fn add_account(&self, account: ConnectedAccount) {
        self.with_state(|s| s.accounts.push(account));
    }

    pub fn add_transaction(&self, activity: TransactionActivity) {
        self.with_state(|s| s.transactions.push(activity));
    }

    pub fn add_bill(&self, bill: RecurringBill) {
        self.with_state(|s| s.bills.push(bill));
    }

    pub fn add_pattern(&self, pattern: SpendingPattern) {
        self.with_state(|s| s.patterns.push(pattern));
    }

    pub fn set_preferences(&self, preferences: NotificationPreferences) {
        self.with_state(|s| {
            s.preferences.insert(preferences.user_id, preferences);
        });
    }

    pub fn add_contact(&self, contact: UserContact) {
        self.with_state(|s| {
            s.contacts.insert(contact.id, contact);
        });
    }

    /// All stored notifications in insertion order.
    pub fn notifications(&self) -> Vec<Notification> {
        self.with_state(|s| {
            s.notifications
                .iter()
                .map(|n| n.notification.clone())
                .collect()
        })
    }
}

fn in_scope(row_user: Uuid, scope: Option<Uuid>) -> bool {
    scope.map_or(true, |u| u == row_user)
}

#[async_trait::async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn find_active_accounts(
        &self,
        user_id: Option<Uuid>,
    ) -> Result<Vec<ConnectedAccount>, StoreError> {
        self.check(StoreOperation::ActiveAccounts)?;
        Ok(self.with_state(|s| {
            s.accounts
                .iter()
                .filter(|a| a.is_active && a.balance.is_some() && in_scope(a.user_id, user_id))
                .cloned()
                .collect()
        }))
    }

    async fn find_debit_transactions_since(
        &self,
        since: NaiveDate,
        user_id: Option<Uuid>,
    ) -> Result<Vec<TransactionActivity>, StoreError> {
        self.check(StoreOperation::DebitTransactions)?;
        Ok(self.with_state(|s| {
            s.transactions
                .iter()
                .filter(|t| {
                    t.transaction.transaction_type == TransactionType::Debit
                        && t.transaction.transaction_date >= since
                        && in_scope(t.transaction.user_id, user_id)
                })
                .cloned()
                .collect()
        }))
    }

    async fn find_transactions_created_since(
        &self,
        since: DateTime<Utc>,
        user_id: Option<Uuid>,
    ) -> Result<Vec<TransactionActivity>, StoreError> {
        self.check(StoreOperation::RecentTransactions)?;
        Ok(self.with_state(|s| {
            s.transactions
                .iter()
                .filter(|t| {
                    t.transaction.created_at >= since && in_scope(t.transaction.user_id, user_id)
                })
                .cloned()
                .collect()
        }))
    }

    async fn find_bills_due_by(
        &self,
        due_by: NaiveDate,
        user_id: Option<Uuid>,
    ) -> Result<Vec<RecurringBill>, StoreError> {
        self.check(StoreOperation::BillsDue)?;
        Ok(self.with_state(|s| {
            s.bills
                .iter()
                .filter(|b| b.is_active && b.next_due_date <= due_by && in_scope(b.user_id, user_id))
                .cloned()
                .collect()
        }))
    }

    async fn find_category_pattern(
        &self,
        user_id: Uuid,
        category: &str,
    ) -> Result<Option<SpendingPattern>, StoreError> {
        self.check(StoreOperation::CategoryPattern)?;
        Ok(self.with_state(|s| {
            s.patterns
                .iter()
                .find(|p| {
                    p.user_id == user_id
                        && p.pattern_type == CATEGORY_AVERAGE
                        && p.category.as_deref() == Some(category)
                })
                .cloned()
        }))
    }

    async fn find_preferences(
        &self,
        user_id: Uuid,
    ) -> Result<Option<NotificationPreferences>, StoreError> {
        self.check(StoreOperation::Preferences)?;
        Ok(self.with_state(|s| s.preferences.get(&user_id).cloned()))
    }

    async fn find_user_contact(&self, user_id: Uuid) -> Result<Option<UserContact>, StoreError> {
        self.check(StoreOperation::UserContact)?;
        Ok(self.with_state(|s| s.contacts.get(&user_id).cloned()))
    }

    async fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Option<Notification>, StoreError> {
        self.check(StoreOperation::InsertNotification)?;
        let dedup = notification.dedup_key();

        Ok(self.with_state(|s| {
            if let Some(dedup) = &dedup {
                let window_start = notification.created_at - dedup.window;
                let duplicate = s.notifications.iter().any(|existing| {
                    existing.notification.user_id == notification.user_id
                        && existing.notification.notification_type
                            == notification.notification_type
                        && existing.dedup_key.as_deref() == Some(dedup.key.as_str())
                        && existing.notification.created_at >= window_start
                });
                if duplicate {
                    return None;
                }
            }

            let stored = notification.into_notification(Uuid::new_v4());
            s.notifications.push(StoredNotification {
                dedup_key: dedup.map(|d| d.key),
                notification: stored.clone(),
            });
            Some(stored)
        }))
    }

    async fn mark_channel_sent(
        &self,
        notification_id: Uuid,
        channel: DeliveryChannel,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.check(StoreOperation::MarkChannelSent)?;
        self.with_state(|s| {
            let stored = s
                .notifications
                .iter_mut()
                .find(|n| n.notification.id == notification_id)
                .ok_or_else(|| StoreError::NotFound(notification_id.to_string()))?;
            stored.notification.record_delivery(channel, at);
            Ok(())
        })
    }
}
