//! Financial advisor request and response models.

use serde::{Deserialize, Serialize};

/// A tracked expense as supplied by the client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseInput {
    #[serde(default)]
    pub id: Option<String>,
    pub amount: f64,
    pub category: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request payload for `POST /ai-financial-advisor`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisorRequest {
    pub message: String,
    #[serde(default)]
    pub expenses: Vec<ExpenseInput>,
    #[serde(default)]
    pub income: Option<f64>,
    #[serde(default)]
    pub goals: Vec<String>,
}

/// Response payload for `POST /ai-financial-advisor`.
#[derive(Debug, Clone, Serialize)]
pub struct AdvisorResponse {
    pub advice: String,
}
