//! Connected account and account transaction models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Aggregation provider an account is connected through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Plaid,
    Yodlee,
    SaltEdge,
    Manual,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Plaid => "plaid",
            Provider::Yodlee => "yodlee",
            Provider::SaltEdge => "salt_edge",
            Provider::Manual => "manual",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plaid" => Ok(Provider::Plaid),
            "yodlee" => Ok(Provider::Yodlee),
            "salt_edge" => Ok(Provider::SaltEdge),
            "manual" => Ok(Provider::Manual),
            _ => Err(format!("Unsupported provider: {}", s)),
        }
    }
}

/// Sync state of a connected account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Pending,
    Syncing,
    Success,
    Error,
    Disconnected,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Pending => "pending",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Success => "success",
            SyncStatus::Error => "error",
            SyncStatus::Disconnected => "disconnected",
        }
    }
}

impl std::str::FromStr for SyncStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SyncStatus::Pending),
            "syncing" => Ok(SyncStatus::Syncing),
            "success" => Ok(SyncStatus::Success),
            "error" => Ok(SyncStatus::Error),
            "disconnected" => Ok(SyncStatus::Disconnected),
            _ => Err(format!("Invalid sync status: {}", s)),
        }
    }
}

/// A financial account linked by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedAccount {
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
    pub sync_status: SyncStatus,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ConnectedAccount {
    pub fn is_crypto(&self) -> bool {
        self.account_type == "crypto"
    }
}

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Debit,
    Credit,
    Transfer,
    Fee,
    Interest,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Debit => "debit",
            TransactionType::Credit => "credit",
            TransactionType::Transfer => "transfer",
            TransactionType::Fee => "fee",
            TransactionType::Interest => "interest",
        }
    }

    /// Sign convention used by providers: positive is money in.
    pub fn from_signed_amount(amount: f64) -> Self {
        if amount > 0.0 {
            TransactionType::Credit
        } else {
            TransactionType::Debit
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debit" => Ok(TransactionType::Debit),
            "credit" => Ok(TransactionType::Credit),
            "transfer" => Ok(TransactionType::Transfer),
            "fee" => Ok(TransactionType::Fee),
            "interest" => Ok(TransactionType::Interest),
            _ => Err(format!("Invalid transaction type: {}", s)),
        }
    }
}

/// A transaction imported from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountTransaction {
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
    pub transaction_type: TransactionType,
    pub transaction_date: NaiveDate,
    pub pending: bool,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// A transaction joined with the account it belongs to, as read by rule checks.
#[derive(Debug, Clone)]
pub struct TransactionActivity {
    pub transaction: AccountTransaction,
    pub account_name: String,
    pub institution_name: Option<String>,
}

/// Kind of sync run requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncType {
    Full,
    #[default]
    Incremental,
    BalanceOnly,
}

impl SyncType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncType::Full => "full",
            SyncType::Incremental => "incremental",
            SyncType::BalanceOnly => "balance_only",
        }
    }
}

/// Status recorded on a sync log row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncLogStatus {
    Started,
    Success,
    Error,
    Partial,
}

impl SyncLogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncLogStatus::Started => "started",
            SyncLogStatus::Success => "success",
            SyncLogStatus::Error => "error",
            SyncLogStatus::Partial => "partial",
        }
    }
}

/// Audit row for one sync run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncLog {
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

/// Request payload for `POST /sync-account`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncAccountRequest {
    pub account_id: Option<Uuid>,
    #[serde(default)]
    pub sync_type: SyncType,
}

/// Response payload for `POST /sync-account`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncAccountResponse {
    pub success: bool,
    pub transaction_count: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
