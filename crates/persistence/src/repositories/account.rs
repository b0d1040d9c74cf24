//! Connected account and transaction repository.

use chrono::{DateTime, NaiveDate, Utc};
use domain::models::{ConnectedAccount, SyncStatus, TransactionActivity};
use domain::services::{BalanceUpdate, ProviderTransaction};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{ConnectedAccountEntity, TransactionActivityEntity};
use crate::metrics::QueryTimer;

const ACCOUNT_COLUMNS: &str = "id, user_id, provider, provider_account_id, account_name, account_type, \
     institution_name, currency, balance, available_balance, sync_status, last_synced_at, \
     is_active, created_at";

const ACTIVITY_SELECT: &str = r#"
    SELECT t.id, t.user_id, t.account_id, t.transaction_id, t.amount, t.currency,
           t.description, t.merchant_name, t.category_primary, t.category_detailed,
           t.transaction_type, t.transaction_date, t.pending, t.metadata, t.created_at,
           a.account_name, a.institution_name
    FROM account_transactions t
    JOIN connected_accounts a ON a.id = t.account_id
"#;

/// Repository for connected accounts and their transactions.
#[derive(Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ConnectedAccount>, sqlx::Error> {
        let timer = QueryTimer::new("find_account_by_id");
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM connected_accounts WHERE id = $1");
        let entity = sqlx::query_as::<_, ConnectedAccountEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        timer.record();
        Ok(entity.map(Into::into))
    }

    /// Active accounts with a known balance, optionally for one user.
    pub async fn find_active_with_balance(
        &self,
        user_id: Option<Uuid>,
    ) -> Result<Vec<ConnectedAccount>, sqlx::Error> {
        let timer = QueryTimer::new("find_active_accounts");
        let sql = format!(
            r#"
            SELECT {ACCOUNT_COLUMNS}
            FROM connected_accounts
            WHERE is_active = TRUE
              AND balance IS NOT NULL
              AND ($1::uuid IS NULL OR user_id = $1)
            "#
        );
        let entities = sqlx::query_as::<_, ConnectedAccountEntity>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        timer.record();
        Ok(entities.into_iter().map(Into::into).collect())
    }

    pub async fn set_sync_status(&self, id: Uuid, status: SyncStatus) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("set_account_sync_status");
        sqlx::query(
            r#"
            UPDATE connected_accounts
            SET sync_status = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;

        timer.record();
        Ok(())
    }

    /// Records the end of a sync, refreshing the balance when one was reported.
    pub async fn finish_sync(
        &self,
        id: Uuid,
        status: SyncStatus,
        balance: Option<BalanceUpdate>,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("finish_account_sync");
        sqlx::query(
            r#"
            UPDATE connected_accounts
            SET sync_status = $2,
                last_synced_at = NOW(),
                balance = COALESCE($3, balance),
                available_balance = COALESCE($4, available_balance),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(balance.map(|b| b.balance))
        .bind(balance.map(|b| b.available_balance))
        .execute(&self.pool)
        .await?;

        timer.record();
        Ok(())
    }

    /// Inserts or refreshes a provider transaction keyed by
    /// `(account_id, transaction_id)`.
    pub async fn upsert_transaction(
        &self,
        account: &ConnectedAccount,
        tx: &ProviderTransaction,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("upsert_account_transaction");
        sqlx::query(
            r#"
            INSERT INTO account_transactions (
                user_id, account_id, transaction_id, amount, currency, description,
                merchant_name, category_primary, category_detailed, transaction_type,
                transaction_date, pending, metadata
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (account_id, transaction_id) DO UPDATE
            SET amount = EXCLUDED.amount,
                currency = EXCLUDED.currency,
                description = EXCLUDED.description,
                merchant_name = EXCLUDED.merchant_name,
                category_primary = EXCLUDED.category_primary,
                category_detailed = EXCLUDED.category_detailed,
                transaction_type = EXCLUDED.transaction_type,
                transaction_date = EXCLUDED.transaction_date,
                pending = EXCLUDED.pending,
                metadata = EXCLUDED.metadata,
                updated_at = NOW()
            "#,
        )
        .bind(account.user_id)
        .bind(account.id)
        .bind(&tx.transaction_id)
        .bind(tx.amount)
        .bind(&tx.currency)
        .bind(&tx.description)
        .bind(&tx.merchant_name)
        .bind(&tx.category_primary)
        .bind(&tx.category_detailed)
        .bind(tx.transaction_type.as_str())
        .bind(tx.transaction_date)
        .bind(tx.pending)
        .bind(&tx.metadata)
        .execute(&self.pool)
        .await?;

        timer.record();
        Ok(())
    }

    /// Debit transactions dated on or after `since`.
    pub async fn find_debits_since(
        &self,
        since: NaiveDate,
        user_id: Option<Uuid>,
    ) -> Result<Vec<TransactionActivity>, sqlx::Error> {
        let timer = QueryTimer::new("find_debit_transactions_since");
        let sql = format!(
            r#"
            {ACTIVITY_SELECT}
            WHERE t.transaction_type = 'debit'
              AND t.transaction_date >= $1
              AND ($2::uuid IS NULL OR t.user_id = $2)
            ORDER BY t.transaction_date DESC
            "#
        );
        let entities = sqlx::query_as::<_, TransactionActivityEntity>(&sql)
            .bind(since)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        timer.record();
        Ok(entities.into_iter().map(Into::into).collect())
    }

    /// Transactions imported at or after `since`.
    pub async fn find_created_since(
        &self,
        since: DateTime<Utc>,
        user_id: Option<Uuid>,
    ) -> Result<Vec<TransactionActivity>, sqlx::Error> {
        let timer = QueryTimer::new("find_transactions_created_since");
        let sql = format!(
            r#"
            {ACTIVITY_SELECT}
            WHERE t.created_at >= $1
              AND ($2::uuid IS NULL OR t.user_id = $2)
            ORDER BY t.created_at DESC
            "#
        );
        let entities = sqlx::query_as::<_, TransactionActivityEntity>(&sql)
            .bind(since)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        timer.record();
        Ok(entities.into_iter().map(Into::into).collect())
    }
}
