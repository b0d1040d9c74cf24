//! Spending pattern repository (read-only).

use domain::models::spending_pattern::CATEGORY_AVERAGE;
use domain::models::SpendingPattern;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::SpendingPatternEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct SpendingPatternRepository {
    pool: PgPool,
}

impl SpendingPatternRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The most recent category-average pattern for a user's category.
    pub async fn find_category_average(
        &self,
        user_id: Uuid,
        category: &str,
    ) -> Result<Option<SpendingPattern>, sqlx::Error> {
        let timer = QueryTimer::new("find_category_pattern");
        let entity = sqlx::query_as::<_, SpendingPatternEntity>(
            r#"
            SELECT id, user_id, pattern_type, category, merchant_name, average_amount,
                   standard_deviation, confidence_score, sample_size, last_updated_at
            FROM spending_patterns
            WHERE user_id = $1 AND pattern_type = $2 AND category = $3
            ORDER BY last_updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(CATEGORY_AVERAGE)
        .bind(category)
        .fetch_optional(&self.pool)
        .await?;

        timer.record();
        Ok(entity.map(Into::into))
    }
}
