//! Subscription repository, written by the Stripe webhook.

use domain::models::{Subscription, SubscriptionUpsert};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::SubscriptionEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts or replaces the subscription keyed by its Stripe id.
    pub async fn upsert(&self, sub: &SubscriptionUpsert) -> Result<Subscription, sqlx::Error> {
        let timer = QueryTimer::new("upsert_subscription");
        let entity = sqlx::query_as::<_, SubscriptionEntity>(
            r#"
            INSERT INTO subscriptions (
                id, user_id, stripe_customer_id, price_id, status,
                current_period_end, cancel_at_period_end
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE
            SET stripe_customer_id = COALESCE(EXCLUDED.stripe_customer_id, subscriptions.stripe_customer_id),
                price_id = COALESCE(EXCLUDED.price_id, subscriptions.price_id),
                status = EXCLUDED.status,
                current_period_end = COALESCE(EXCLUDED.current_period_end, subscriptions.current_period_end),
                cancel_at_period_end = EXCLUDED.cancel_at_period_end,
                updated_at = NOW()
            RETURNING id, user_id, stripe_customer_id, price_id, status,
                      current_period_end, cancel_at_period_end, updated_at
            "#,
        )
        .bind(&sub.id)
        .bind(sub.user_id)
        .bind(&sub.stripe_customer_id)
        .bind(&sub.price_id)
        .bind(&sub.status)
        .bind(sub.current_period_end)
        .bind(sub.cancel_at_period_end)
        .fetch_one(&self.pool)
        .await?;

        timer.record();
        Ok(entity.into())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Subscription>, sqlx::Error> {
        let timer = QueryTimer::new("find_subscription_by_id");
        let entity = sqlx::query_as::<_, SubscriptionEntity>(
            r#"
            SELECT id, user_id, stripe_customer_id, price_id, status,
                   current_period_end, cancel_at_period_end, updated_at
            FROM subscriptions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        timer.record();
        Ok(entity.map(Into::into))
    }

    /// Stripe customer id from the user's most recently updated active subscription.
    pub async fn find_customer_id(&self, user_id: Uuid) -> Result<Option<String>, sqlx::Error> {
        let timer = QueryTimer::new("find_stripe_customer_id");
        let customer: Option<(Option<String>,)> = sqlx::query_as(
            r#"
            SELECT stripe_customer_id
            FROM subscriptions
            WHERE user_id = $1
              AND stripe_customer_id IS NOT NULL
              AND status IN ('active', 'trialing')
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        timer.record();
        Ok(customer.and_then(|(id,)| id))
    }
}
