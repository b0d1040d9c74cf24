//! Connected account and transaction entities (database row mappings).

use chrono::{DateTime, NaiveDate, Utc};
use domain::models::{
    AccountTransaction, ConnectedAccount, SyncStatus, TransactionActivity, TransactionType,
};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Database row mapping for the connected_accounts table.
#[derive(Debug, Clone, FromRow)]
pub struct ConnectedAccountEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider: String,
    pub provider_account_id: String,
    pub account_name: String,
    pub account_type: String,
    pub institution_name: Option<String>,
    pub currency: String,
    pub balance: Option<f64>,
    pub available_balance: Option<f64>,
    pub sync_status: String,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ConnectedAccountEntity> for ConnectedAccount {
    fn from(entity: ConnectedAccountEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            provider: entity.provider,
            provider_account_id: entity.provider_account_id,
            account_name: entity.account_name,
            account_type: entity.account_type,
            institution_name: entity.institution_name,
            currency: entity.currency,
            balance: entity.balance,
            available_balance: entity.available_balance,
            sync_status: SyncStatus::from_str(&entity.sync_status).unwrap_or(SyncStatus::Pending),
            last_synced_at: entity.last_synced_at,
            is_active: entity.is_active,
            created_at: entity.created_at,
        }
    }
}

/// A transaction row joined with its account's display fields.
#[derive(Debug, Clone, FromRow)]
pub struct TransactionActivityEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub account_id: Uuid,
    pub transaction_id: String,
    pub amount: f64,
    pub currency: String,
    pub description: String,
    pub merchant_name: Option<String>,
    pub category_primary: Option<String>,
    pub category_detailed: Option<String>,
    pub transaction_type: String,
    pub transaction_date: NaiveDate,
    pub pending: bool,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub account_name: String,
    pub institution_name: Option<String>,
}

impl From<TransactionActivityEntity> for TransactionActivity {
    fn from(e: TransactionActivityEntity) -> Self {
        let transaction_type = TransactionType::from_str(&e.transaction_type)
            .unwrap_or_else(|_| TransactionType::from_signed_amount(e.amount));
        Self {
            transaction: AccountTransaction {
                id: e.id,
                user_id: e.user_id,
                account_id: e.account_id,
                transaction_id: e.transaction_id,
                amount: e.amount,
                currency: e.currency,
                description: e.description,
                merchant_name: e.merchant_name,
                category_primary: e.category_primary,
                category_detailed: e.category_detailed,
                transaction_type,
                transaction_date: e.transaction_date,
                pending: e.pending,
                metadata: e.metadata,
                created_at: e.created_at,
            },
            account_name: e.account_name,
            institution_name: e.institution_name,
        }
    }
}
