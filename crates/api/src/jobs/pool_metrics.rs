//! Publishes database connection pool gauges.

use sqlx::PgPool;

use super::scheduler::{Job, JobFrequency};

pub struct PoolMetricsJob {
    pool: PgPool,
}

impl PoolMetricsJob {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl Job for PoolMetricsJob {
    fn name(&self) -> &'static str {
        "pool_metrics"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(15)
    }

    async fn execute(&self) -> Result<(), String> {
        persistence::metrics::record_pool_metrics(&self.pool);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    #[tokio::test]
    async fn test_records_without_connecting() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/smartsaver_unused")
            .unwrap();
        let job = PoolMetricsJob::new(pool);
        assert_eq!(job.name(), "pool_metrics");
        assert_eq!(job.frequency(), JobFrequency::Seconds(15));
        assert!(job.execute().await.is_ok());
    }
}
