pub mod advisor;
pub mod billing;
pub mod email_notifications;
pub mod health;
pub mod notification_engine;
pub mod notifications;
pub mod preferences;
pub mod sync_account;
