//! Spending pattern entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the spending_patterns table.
#[derive(Debug, Clone, FromRow)]
pub struct SpendingPatternEntity {
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

impl From<SpendingPatternEntity> for domain::models::SpendingPattern {
    fn from(entity: SpendingPatternEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            pattern_type: entity.pattern_type,
            category: entity.category,
            merchant_name: entity.merchant_name,
            average_amount: entity.average_amount,
            standard_deviation: entity.standard_deviation,
            confidence_score: entity.confidence_score,
            sample_size: entity.sample_size,
            last_updated_at: entity.last_updated_at,
        }
    }
}
