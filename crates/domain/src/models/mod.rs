//! Domain models for SmartSaver.

pub mod account;
pub mod advisor;
pub mod email;
pub mod notification;
pub mod preferences;
pub mod recurring_bill;
pub mod spending_pattern;
pub mod subscription;
pub mod user;

pub use account::{
    AccountTransaction, ConnectedAccount, Provider, SyncStatus, SyncType, TransactionActivity,
    TransactionType,
};
pub use advisor::{AdvisorRequest, AdvisorResponse, ExpenseInput};
pub use email::{EmailMessage, RenderedEmail, SendEmailRequest, SendEmailResponse};
pub use notification::{
    DeliveryChannel, NewNotification, Notification, NotificationMetadata, NotificationPriority,
    NotificationType,
};
pub use preferences::{NotificationPreferences, UpdatePreferencesRequest};
pub use recurring_bill::RecurringBill;
pub use spending_pattern::SpendingPattern;
pub use subscription::{Subscription, SubscriptionUpsert};
pub use user::UserContact;
