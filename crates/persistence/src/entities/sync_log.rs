//! Sync log entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the sync_logs table.
#[derive(Debug, Clone, FromRow)]
pub struct SyncLogEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub account_id: Option<Uuid>,
    pub sync_type: String,
    pub status: String,
    pub transactions_synced: i32,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<SyncLogEntity> for domain::models::account::SyncLog {
    fn from(entity: SyncLogEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            account_id: entity.account_id,
            sync_type: entity.sync_type,
            status: entity.status,
            transactions_synced: entity.transactions_synced,
            error_message: entity.error_message,
            started_at: entity.started_at,
            completed_at: entity.completed_at,
        }
    }
}
