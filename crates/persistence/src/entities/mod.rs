//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod account;
pub mod notification;
pub mod notification_preferences;
pub mod recurring_bill;
pub mod spending_pattern;
pub mod subscription;
pub mod sync_log;
pub mod user_profile;

pub use account::{ConnectedAccountEntity, TransactionActivityEntity};
pub use notification::{NotificationCountsEntity, NotificationEntity, NOTIFICATION_COLUMNS};
pub use notification_preferences::NotificationPreferencesEntity;
pub use recurring_bill::RecurringBillEntity;
pub use spending_pattern::SpendingPatternEntity;
pub use subscription::SubscriptionEntity;
pub use sync_log::SyncLogEntity;
pub use user_profile::UserProfileEntity;
