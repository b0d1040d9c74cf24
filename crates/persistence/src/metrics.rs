//! Database metrics: per-query latency and pool gauges.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Record how long a named query took.
pub fn record_query_duration(query_name: &'static str, duration_secs: f64) {
    histogram!("database_query_duration_seconds", "query" => query_name).record(duration_secs);
}

/// Snapshot of pool usage; called from the periodic pool-metrics job.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();
    let active = size.saturating_sub(idle);

    gauge!("database_connections_active").set(active as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}

/// Times one repository query.
///
/// ```ignore
/// let timer = QueryTimer::new("find_account_by_id");
/// let row = sqlx::query_as::<_, ConnectedAccountEntity>(SQL).fetch_optional(&pool).await?;
/// timer.record();
/// ```
///
/// A timer dropped without [`QueryTimer::record`] (the query returned early
/// through `?`) counts as a failed query instead.
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
    recorded: bool,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
            recorded: false,
        }
    }

    pub fn record(mut self) {
        self.recorded = true;
        record_query_duration(self.query_name, self.start.elapsed().as_secs_f64());
    }
}

impl Drop for QueryTimer {
    fn drop(&mut self) {
        if !self.recorded {
            counter!("database_query_errors_total", "query" => self.query_name).increment(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_timer_records_name() {
        let timer = QueryTimer::new("find_notifications");
        assert_eq!(timer.query_name, "find_notifications");
        assert!(!timer.recorded);
        timer.record();
    }

    #[test]
    fn test_unrecorded_timer_drops_cleanly() {
        let timer = QueryTimer::new("upsert_subscription");
        drop(timer);
    }
}
