//! Periodic run of the notification rule checks.

use std::sync::Arc;

use domain::services::NotificationEngine;
use tracing::{info, warn};

use super::scheduler::{Job, JobFrequency};

/// Runs all four rule checks for every user on a fixed schedule.
pub struct NotificationChecksJob {
    engine: Arc<NotificationEngine>,
    interval_minutes: u64,
}

impl NotificationChecksJob {
    pub fn new(engine: Arc<NotificationEngine>, interval_minutes: u64) -> Self {
        Self {
            engine,
            interval_minutes,
        }
    }
}

#[async_trait::async_trait]
impl Job for NotificationChecksJob {
    fn name(&self) -> &'static str {
        "notification_checks"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(self.interval_minutes)
    }

    /// Individual check failures are logged by the engine and do not fail
    /// the job; only a run where every check failed is reported as an error.
    async fn execute(&self) -> Result<(), String> {
        let report = self.engine.run_checks(None).await;
        let failed = report.failed_checks();

        if !failed.is_empty() {
            warn!(
                failed = ?failed.iter().map(|c| c.as_str()).collect::<Vec<_>>(),
                "Some notification checks failed"
            );
        }
        info!(
            created = report.total_created(),
            "Scheduled notification checks finished"
        );

        if report.all_failed() {
            return Err("All notification checks failed".to_string());
        }
        Ok(())
    }
}
