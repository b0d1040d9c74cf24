//! Account aggregation providers.
//!
//! Each provider turns a connected account into a batch of normalized
//! transactions plus an optional balance refresh. The bundled providers return
//! canned data; real clients plug in behind [`AccountProvider`].

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use thiserror::Error;

use crate::models::account::{SyncAccountResponse, SyncLogStatus};
use crate::models::{ConnectedAccount, Provider, SyncStatus, SyncType, TransactionType};

/// Errors raised while syncing an account.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Account ID is required")]
    MissingAccountId,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result of a sync run that got past account and provider lookup.
///
/// `error` is set when the provider fetch or an upsert failed; rows written
/// before the failure still count.
#[derive(Debug)]
pub struct SyncOutcome {
    pub transaction_count: i32,
    pub error: Option<SyncError>,
}

impl SyncOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    /// Status recorded on the sync log and on the account.
    pub fn statuses(&self) -> (SyncLogStatus, SyncStatus) {
        match (&self.error, self.transaction_count) {
            (None, _) => (SyncLogStatus::Success, SyncStatus::Success),
            (Some(_), 0) => (SyncLogStatus::Error, SyncStatus::Error),
            (Some(_), _) => (SyncLogStatus::Partial, SyncStatus::Error),
        }
    }
}

impl From<SyncOutcome> for SyncAccountResponse {
    fn from(outcome: SyncOutcome) -> Self {
        Self {
            success: outcome.error.is_none(),
            transaction_count: outcome.transaction_count,
            error: outcome.error.map(|e| e.to_string()),
        }
    }
}

/// A transaction normalized from a provider payload, ready to upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderTransaction {
    pub transaction_id: String,
    pub amount: f64,
    pub currency: String,
    pub description: String,
    pub merchant_name: Option<String>,
    pub category_primary: Option<String>,
    pub category_detailed: Option<String>,
    pub transaction_type: TransactionType,
    pub transaction_date: NaiveDate,
    pub pending: bool,
    pub metadata: serde_json::Value,
}

/// Balance reported by a provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceUpdate {
    pub balance: f64,
    pub available_balance: f64,
}

/// Everything a provider returned for one account.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderBatch {
    pub transactions: Vec<ProviderTransaction>,
    pub balance: Option<BalanceUpdate>,
}

#[async_trait::async_trait]
pub trait AccountProvider: Send + Sync {
    fn provider(&self) -> Provider;

    async fn fetch(
        &self,
        account: &ConnectedAccount,
        sync_type: SyncType,
    ) -> Result<ProviderBatch, SyncError>;
}

/// Maps a Plaid category hierarchy to an app category.
///
/// The first level with a known mapping wins; anything else is `Other`.
pub fn map_plaid_category(categories: &[&str]) -> &'static str {
    categories
        .iter()
        .find_map(|c| match *c {
            "Food and Drink" | "Restaurants" | "Groceries" => Some("Food"),
            "Transportation" | "Gas Stations" => Some("Transport"),
            "Entertainment" => Some("Entertainment"),
            "Shopping" => Some("Shopping"),
            "Healthcare" => Some("Healthcare"),
            "Rent" => Some("Rent"),
            "Utilities" => Some("Utilities"),
            "Travel" => Some("Travel"),
            "Education" => Some("Education"),
            _ => None,
        })
        .unwrap_or("Other")
}

/// Normalizes a Yodlee category code: lowercase, first underscore to a space.
pub fn normalize_yodlee_category(category: &str) -> String {
    category.to_lowercase().replacen('_', " ", 1)
}

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate, SyncError> {
    NaiveDate::from_ymd_opt(y, m, d)
        .ok_or_else(|| SyncError::Provider(format!("invalid date {}-{}-{}", y, m, d)))
}

/// Canned Plaid client.
#[derive(Debug, Default)]
pub struct PlaidProvider;

impl PlaidProvider {
    pub const SAMPLE_BALANCE: f64 = 2450.75;
}

#[async_trait::async_trait]
impl AccountProvider for PlaidProvider {
    fn provider(&self) -> Provider {
        Provider::Plaid
    }

    async fn fetch(
        &self,
        _account: &ConnectedAccount,
        sync_type: SyncType,
    ) -> Result<ProviderBatch, SyncError> {
        let balance = Some(BalanceUpdate {
            balance: Self::SAMPLE_BALANCE,
            available_balance: Self::SAMPLE_BALANCE,
        });
        if sync_type == SyncType::BalanceOnly {
            return Ok(ProviderBatch {
                transactions: Vec::new(),
                balance,
            });
        }

        let samples: [(&str, f64, NaiveDate, &str, Option<&str>, &[&str]); 3] = [
            (
                "plaid_tx_1",
                -25.50,
                date(2024, 1, 15)?,
                "Starbucks Coffee",
                Some("Starbucks"),
                &["Food and Drink", "Restaurants", "Coffee"],
            ),
            (
                "plaid_tx_2",
                -85.00,
                date(2024, 1, 14)?,
                "Shell Gas Station",
                Some("Shell"),
                &["Transportation", "Gas Stations"],
            ),
            (
                "plaid_tx_3",
                2500.00,
                date(2024, 1, 13)?,
                "Direct Deposit Payroll",
                None,
                &["Deposit", "Payroll"],
            ),
        ];

        let transactions = samples
            .into_iter()
            .map(|(id, amount, day, name, merchant, categories)| ProviderTransaction {
                transaction_id: id.to_string(),
                amount,
                currency: "USD".to_string(),
                description: name.to_string(),
                merchant_name: merchant.map(str::to_string),
                category_primary: Some(map_plaid_category(categories).to_string()),
                category_detailed: Some(categories.join(" > ")),
                transaction_type: TransactionType::from_signed_amount(amount),
                transaction_date: day,
                pending: false,
                metadata: json!({ "provider": "plaid", "original_category": categories }),
            })
            .collect();

        Ok(ProviderBatch {
            transactions,
            balance,
        })
    }
}

/// Canned Yodlee client.
#[derive(Debug, Default)]
pub struct YodleeProvider;

#[async_trait::async_trait]
impl AccountProvider for YodleeProvider {
    fn provider(&self) -> Provider {
        Provider::Yodlee
    }

    async fn fetch(
        &self,
        _account: &ConnectedAccount,
        sync_type: SyncType,
    ) -> Result<ProviderBatch, SyncError> {
        if sync_type == SyncType::BalanceOnly {
            return Ok(ProviderBatch::default());
        }

        let samples = [
            (
                "yodlee_tx_1",
                -45.20,
                date(2024, 1, 15)?,
                "Amazon Purchase",
                Some("Amazon"),
                "SHOPPING",
                "POSTED",
            ),
            (
                "yodlee_tx_2",
                -120.00,
                date(2024, 1, 14)?,
                "Electric Bill Payment",
                None,
                "UTILITIES",
                "POSTED",
            ),
        ];

        let transactions = samples
            .into_iter()
            .map(
                |(id, amount, day, description, merchant, category, status)| ProviderTransaction {
                    transaction_id: id.to_string(),
                    amount,
                    currency: "USD".to_string(),
                    description: description.to_string(),
                    merchant_name: merchant.map(str::to_string),
                    category_primary: Some(normalize_yodlee_category(category)),
                    category_detailed: None,
                    transaction_type: TransactionType::from_signed_amount(amount),
                    transaction_date: day,
                    pending: status == "PENDING",
                    metadata: json!({ "provider": "yodlee", "original_category": category }),
                },
            )
            .collect();

        Ok(ProviderBatch {
            transactions,
            balance: None,
        })
    }
}

/// Salt Edge: accepted but not wired to a client, so it syncs nothing.
#[derive(Debug, Default)]
pub struct SaltEdgeProvider;

#[async_trait::async_trait]
impl AccountProvider for SaltEdgeProvider {
    fn provider(&self) -> Provider {
        Provider::SaltEdge
    }

    async fn fetch(
        &self,
        _account: &ConnectedAccount,
        _sync_type: SyncType,
    ) -> Result<ProviderBatch, SyncError> {
        Ok(ProviderBatch::default())
    }
}

/// Manually tracked accounts. Crypto wallets get canned trades valued in USD;
/// other manual accounts have nothing to pull.
#[derive(Debug, Default)]
pub struct ManualProvider;

#[async_trait::async_trait]
impl AccountProvider for ManualProvider {
    fn provider(&self) -> Provider {
        Provider::Manual
    }

    async fn fetch(
        &self,
        account: &ConnectedAccount,
        sync_type: SyncType,
    ) -> Result<ProviderBatch, SyncError> {
        if !account.is_crypto() || sync_type == SyncType::BalanceOnly {
            return Ok(ProviderBatch::default());
        }

        // (id, crypto amount, usd value, description, date)
        let samples = [
            ("crypto_tx_1", 0.025, 1250.00, "Bitcoin Purchase", date(2024, 1, 15)?),
            ("crypto_tx_2", -0.01, -500.00, "Bitcoin Transfer", date(2024, 1, 14)?),
        ];

        let transactions = samples
            .into_iter()
            .map(|(id, crypto_amount, usd_value, description, day)| ProviderTransaction {
                transaction_id: id.to_string(),
                amount: usd_value,
                currency: "USD".to_string(),
                description: description.to_string(),
                merchant_name: None,
                category_primary: Some("Investment".to_string()),
                category_detailed: None,
                transaction_type: TransactionType::from_signed_amount(crypto_amount),
                transaction_date: day,
                pending: false,
                metadata: json!({
                    "provider": "crypto",
                    "crypto_amount": crypto_amount,
                    "crypto_currency": "BTC",
                }),
            })
            .collect();

        Ok(ProviderBatch {
            transactions,
            balance: None,
        })
    }
}

/// Provider lookup by the account's `provider` column.
#[derive(Clone)]
pub struct ProviderRegistry {
    providers: HashMap<&'static str, Arc<dyn AccountProvider>>,
}

impl ProviderRegistry {
    pub fn empty() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    pub fn register(mut self, provider: Arc<dyn AccountProvider>) -> Self {
        self.providers.insert(provider.provider().as_str(), provider);
        self
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn AccountProvider>, SyncError> {
        let provider = Provider::from_str(name)
            .map_err(|_| SyncError::UnsupportedProvider(name.to_string()))?;
        self.providers
            .get(provider.as_str())
            .cloned()
            .ok_or_else(|| SyncError::UnsupportedProvider(name.to_string()))
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::empty()
            .register(Arc::new(PlaidProvider))
            .register(Arc::new(YodleeProvider))
            .register(Arc::new(SaltEdgeProvider))
            .register(Arc::new(ManualProvider))
    }
}
