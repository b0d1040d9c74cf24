//! Domain services for SmartSaver.
//!
//! Services contain business logic that operates on domain models.

pub mod account_sync;
pub mod advisor;
pub mod engine;
pub mod notification;
pub mod store;

pub use account_sync::{
    AccountProvider, BalanceUpdate, ProviderBatch, ProviderRegistry, ProviderTransaction,
    SyncError, SyncOutcome,
};
pub use advisor::generate_advice;
pub use engine::{CheckOutcome, CheckRunReport, EngineError, NotificationEngine, RuleCheck};
pub use notification::{DeliveryResult, MockNotificationChannel, NotificationChannel};
pub use store::{InMemoryNotificationStore, NotificationStore, StoreError, StoreOperation};
