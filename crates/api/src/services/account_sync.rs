//! Connected-account sync: provider fetch, transaction upserts and sync log.

use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use domain::models::{ConnectedAccount, SyncStatus, SyncType};
use domain::services::{
    AccountProvider, BalanceUpdate, ProviderRegistry, SyncError, SyncOutcome,
};
use persistence::repositories::{AccountRepository, SyncLogRepository};

/// Runs one sync of one account.
#[derive(Clone)]
pub struct AccountSyncService {
    accounts: AccountRepository,
    logs: SyncLogRepository,
    providers: ProviderRegistry,
}

struct SyncProgress {
    synced: i32,
    error: Option<SyncError>,
    balance: Option<BalanceUpdate>,
}

impl AccountSyncService {
    pub fn new(pool: PgPool, providers: ProviderRegistry) -> Self {
        Self {
            accounts: AccountRepository::new(pool.clone()),
            logs: SyncLogRepository::new(pool),
            providers,
        }
    }

    /// Syncs `account_id`.
    ///
    /// `Err` means the run never started: the account or its provider could
    /// not be resolved, or the sync log could not be opened. Failures after
    /// that come back as an [`SyncOutcome`] carrying the error and the rows
    /// written so far; the sync log and account status record them too.
    pub async fn sync(
        &self,
        account_id: Uuid,
        sync_type: SyncType,
    ) -> Result<SyncOutcome, SyncError> {
        let account = self
            .accounts
            .find_by_id(account_id)
            .await
            .map_err(storage)?
            .ok_or(SyncError::AccountNotFound)?;
        let provider = self.providers.get(&account.provider)?;

        let log = self
            .logs
            .start(account.user_id, account.id, sync_type)
            .await
            .map_err(storage)?;
        self.accounts
            .set_sync_status(account.id, SyncStatus::Syncing)
            .await
            .map_err(storage)?;

        let progress = self.run(provider.as_ref(), &account, sync_type).await;
        let outcome = SyncOutcome {
            transaction_count: progress.synced,
            error: progress.error,
        };

        let (log_status, account_status) = outcome.statuses();
        let error_message = outcome.error.as_ref().map(|e| e.to_string());

        self.logs
            .complete(log.id, log_status, outcome.transaction_count, error_message.as_deref())
            .await
            .map_err(storage)?;
        self.accounts
            .finish_sync(account.id, account_status, progress.balance)
            .await
            .map_err(storage)?;

        match &outcome.error {
            None => info!(
                account_id = %account.id,
                provider = %account.provider,
                sync_type = sync_type.as_str(),
                transactions = outcome.transaction_count,
                "Account sync completed"
            ),
            Some(e) => warn!(
                account_id = %account.id,
                provider = %account.provider,
                transactions = outcome.transaction_count,
                error = %e,
                "Account sync failed"
            ),
        }
        Ok(outcome)
    }

    async fn run(
        &self,
        provider: &dyn AccountProvider,
        account: &ConnectedAccount,
        sync_type: SyncType,
    ) -> SyncProgress {
        let mut progress = SyncProgress {
            synced: 0,
            error: None,
            balance: None,
        };

        let batch = match provider.fetch(account, sync_type).await {
            Ok(batch) => batch,
            Err(e) => {
                progress.error = Some(e);
                return progress;
            }
        };

        for tx in &batch.transactions {
            if let Err(e) = self.accounts.upsert_transaction(account, tx).await {
                progress.error = Some(storage(e));
                return progress;
            }
            progress.synced += 1;
        }
        progress.balance = batch.balance;
        progress
    }
}

fn storage(err: sqlx::Error) -> SyncError {
    SyncError::Storage(err.to_string())
}
