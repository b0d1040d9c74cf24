//! Postgres-backed [`NotificationStore`] for the rule engine.

use chrono::{DateTime, NaiveDate, Utc};
use domain::models::{
    ConnectedAccount, DeliveryChannel, NewNotification, Notification, NotificationPreferences,
    RecurringBill, SpendingPattern, TransactionActivity, UserContact,
};
use domain::services::{NotificationStore, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::repositories::{
    AccountRepository, NotificationPreferencesRepository, NotificationRepository,
    RecurringBillRepository, SpendingPatternRepository, UserProfileRepository,
};

fn db_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::RowNotFound => StoreError::NotFound("row not found".to_string()),
        sqlx::Error::ColumnDecode { index, source } => {
            StoreError::InvalidData(format!("column {}: {}", index, source))
        }
        other => StoreError::Database(other.to_string()),
    }
}

/// Store that reads candidates and writes notifications through the
/// repositories.
#[derive(Clone)]
pub struct PgNotificationStore {
    accounts: AccountRepository,
    bills: RecurringBillRepository,
    patterns: SpendingPatternRepository,
    preferences: NotificationPreferencesRepository,
    profiles: UserProfileRepository,
    notifications: NotificationRepository,
}

impl PgNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            accounts: AccountRepository::new(pool.clone()),
            bills: RecurringBillRepository::new(pool.clone()),
            patterns: SpendingPatternRepository::new(pool.clone()),
            preferences: NotificationPreferencesRepository::new(pool.clone()),
            profiles: UserProfileRepository::new(pool.clone()),
            notifications: NotificationRepository::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl NotificationStore for PgNotificationStore {
    async fn find_active_accounts(
        &self,
        user_id: Option<Uuid>,
    ) -> Result<Vec<ConnectedAccount>, StoreError> {
        self.accounts
            .find_active_with_balance(user_id)
            .await
            .map_err(db_error)
    }

    async fn find_debit_transactions_since(
        &self,
        since: NaiveDate,
        user_id: Option<Uuid>,
    ) -> Result<Vec<TransactionActivity>, StoreError> {
        self.accounts
            .find_debits_since(since, user_id)
            .await
            .map_err(db_error)
    }

    async fn find_transactions_created_since(
        &self,
        since: DateTime<Utc>,
        user_id: Option<Uuid>,
    ) -> Result<Vec<TransactionActivity>, StoreError> {
        self.accounts
            .find_created_since(since, user_id)
            .await
            .map_err(db_error)
    }

    async fn find_bills_due_by(
        &self,
        due_by: NaiveDate,
        user_id: Option<Uuid>,
    ) -> Result<Vec<RecurringBill>, StoreError> {
        self.bills.find_due_by(due_by, user_id).await.map_err(db_error)
    }

    async fn find_category_pattern(
        &self,
        user_id: Uuid,
        category: &str,
    ) -> Result<Option<SpendingPattern>, StoreError> {
        self.patterns
            .find_category_average(user_id, category)
            .await
            .map_err(db_error)
    }

    async fn find_preferences(
        &self,
        user_id: Uuid,
    ) -> Result<Option<NotificationPreferences>, StoreError> {
        self.preferences.find(user_id).await.map_err(db_error)
    }

    async fn find_user_contact(&self, user_id: Uuid) -> Result<Option<UserContact>, StoreError> {
        self.profiles.find(user_id).await.map_err(db_error)
    }

    async fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Option<Notification>, StoreError> {
        self.notifications
            .insert_deduplicated(&notification)
            .await
            .map_err(db_error)
    }

    async fn mark_channel_sent(
        &self,
        notification_id: Uuid,
        channel: DeliveryChannel,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let updated = self
            .notifications
            .mark_channel_sent(notification_id, channel, at)
            .await
            .map_err(db_error)?;
        if !updated {
            return Err(StoreError::NotFound(format!(
                "notification {}",
                notification_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert!(matches!(
            db_error(sqlx::Error::RowNotFound),
            StoreError::NotFound(_)
        ));
    }

    #[test]
    fn test_other_errors_map_to_database() {
        let err = db_error(sqlx::Error::PoolTimedOut);
        match err {
            StoreError::Database(msg) => assert!(msg.contains("timed out")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
