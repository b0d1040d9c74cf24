//! Repository implementations for database operations.

pub mod account;
pub mod notification;
pub mod notification_preferences;
pub mod recurring_bill;
pub mod spending_pattern;
pub mod subscription;
pub mod sync_log;
pub mod user_profile;

pub use account::AccountRepository;
pub use notification::{NotificationPageQuery, NotificationRepository};
pub use notification_preferences::NotificationPreferencesRepository;
pub use recurring_bill::RecurringBillRepository;
pub use spending_pattern::SpendingPatternRepository;
pub use subscription::SubscriptionRepository;
pub use sync_log::SyncLogRepository;
pub use user_profile::UserProfileRepository;
