//! Sync log repository.

use domain::models::account::{SyncLog, SyncLogStatus};
use domain::models::SyncType;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::SyncLogEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct SyncLogRepository {
    pool: PgPool,
}

impl SyncLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a log row in `started` state.
    pub async fn start(
        &self,
        user_id: Uuid,
        account_id: Uuid,
        sync_type: SyncType,
    ) -> Result<SyncLog, sqlx::Error> {
        let timer = QueryTimer::new("start_sync_log");
        let entity = sqlx::query_as::<_, SyncLogEntity>(
            r#"
            INSERT INTO sync_logs (user_id, account_id, sync_type, status)
            VALUES ($1, $2, $3, 'started')
            RETURNING id, user_id, account_id, sync_type, status, transactions_synced,
                      error_message, started_at, completed_at
            "#,
        )
        .bind(user_id)
        .bind(account_id)
        .bind(sync_type.as_str())
        .fetch_one(&self.pool)
        .await?;

        timer.record();
        Ok(entity.into())
    }

    /// Closes a log row with the run's outcome.
    pub async fn complete(
        &self,
        id: Uuid,
        status: SyncLogStatus,
        transactions_synced: i32,
        error_message: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("complete_sync_log");
        sqlx::query(
            r#"
            UPDATE sync_logs
            SET status = $2,
                transactions_synced = $3,
                error_message = $4,
                completed_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(transactions_synced)
        .bind(error_message)
        .execute(&self.pool)
        .await?;

        timer.record();
        Ok(())
    }
}
