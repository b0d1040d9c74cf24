//! Background job scheduler and job implementations.

mod notification_checks;
mod pool_metrics;
mod scheduler;

pub use notification_checks::NotificationChecksJob;
pub use pool_metrics::PoolMetricsJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
