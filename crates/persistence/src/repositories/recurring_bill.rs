//! Recurring bill repository.

use chrono::NaiveDate;
use domain::models::RecurringBill;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::RecurringBillEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct RecurringBillRepository {
    pool: PgPool,
}

impl RecurringBillRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Active bills due on or before `due_by`, overdue ones included.
    pub async fn find_due_by(
        &self,
        due_by: NaiveDate,
        user_id: Option<Uuid>,
    ) -> Result<Vec<RecurringBill>, sqlx::Error> {
        let timer = QueryTimer::new("find_bills_due_by");
        let entities = sqlx::query_as::<_, RecurringBillEntity>(
            r#"
            SELECT id, user_id, name, merchant_name, category, amount, frequency,
                   next_due_date, remind_days_before, is_active, created_at
            FROM recurring_bills
            WHERE is_active = TRUE
              AND next_due_date <= $1
              AND ($2::uuid IS NULL OR user_id = $2)
            ORDER BY next_due_date ASC
            "#,
        )
        .bind(due_by)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        timer.record();
        Ok(entities.into_iter().map(Into::into).collect())
    }
}
