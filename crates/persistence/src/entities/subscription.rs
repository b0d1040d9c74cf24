//! Subscription entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the subscriptions table.
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionEntity {
    pub id: String,
    pub user_id: Uuid,
    pub stripe_customer_id: Option<String>,
    pub price_id: Option<String>,
    pub status: String,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<SubscriptionEntity> for domain::models::Subscription {
    fn from(entity: SubscriptionEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            stripe_customer_id: entity.stripe_customer_id,
            price_id: entity.price_id,
            status: entity.status,
            current_period_end: entity.current_period_end,
            cancel_at_period_end: entity.cancel_at_period_end,
            updated_at: entity.updated_at,
        }
    }
}
