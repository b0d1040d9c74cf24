//! Recurring bill model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bill the user expects to pay on a cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringBill {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub merchant_name: Option<String>,
    pub category: String,
    pub amount: Option<f64>,
    /// `weekly`, `bi_weekly`, `monthly`, `quarterly` or `yearly`.
    pub frequency: String,
    pub next_due_date: NaiveDate,
    pub remind_days_before: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl RecurringBill {
    /// Whole calendar days from `today` until the due date; negative when overdue.
    pub fn days_until_due(&self, today: NaiveDate) -> i64 {
        (self.next_due_date - today).num_days()
    }
}
