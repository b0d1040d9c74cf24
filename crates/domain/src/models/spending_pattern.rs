//! Precomputed spending baselines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pattern type used as the per-category baseline for anomaly checks.
pub const CATEGORY_AVERAGE: &str = "category_average";

/// Rolling statistics for a user's spending, computed elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingPattern {
    pub id: Uuid,
    pub user_id: Uuid,
    pub pattern_type: String,
    pub category: Option<String>,
    pub merchant_name: Option<String>,
    pub average_amount: Option<f64>,
    pub standard_deviation: Option<f64>,
    pub confidence_score: f64,
    pub sample_size: i32,
    pub last_updated_at: DateTime<Utc>,
}

impl SpendingPattern {
    /// Average usable as a divisor: present and strictly positive.
    pub fn usable_average(&self) -> Option<f64> {
        self.average_amount.filter(|avg| *avg > 0.0)
    }
}
