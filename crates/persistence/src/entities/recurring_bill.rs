//! Recurring bill entity (database row mapping).

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the recurring_bills table.
#[derive(Debug, Clone, FromRow)]
pub struct RecurringBillEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub merchant_name: Option<String>,
    pub category: String,
    pub amount: Option<f64>,
    pub frequency: String,
    pub next_due_date: NaiveDate,
    pub remind_days_before: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<RecurringBillEntity> for domain::models::RecurringBill {
    fn from(entity: RecurringBillEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            name: entity.name,
            merchant_name: entity.merchant_name,
            category: entity.category,
            amount: entity.amount,
            frequency: entity.frequency,
            next_due_date: entity.next_due_date,
            remind_days_before: entity.remind_days_before,
            is_active: entity.is_active,
            created_at: entity.created_at,
        }
    }
}
