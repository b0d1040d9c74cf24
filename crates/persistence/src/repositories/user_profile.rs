//! User profile repository.

use domain::models::UserContact;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::UserProfileEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct UserProfileRepository {
    pool: PgPool,
}

impl UserProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<UserContact>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_profile");
        let entity = sqlx::query_as::<_, UserProfileEntity>(
            "SELECT id, email, display_name FROM user_profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        timer.record();
        Ok(entity.map(Into::into))
    }

    /// Makes sure a profile row exists for an authenticated user, filling in
    /// the email if it was unknown.
    pub async fn ensure(&self, id: Uuid, email: Option<&str>) -> Result<UserContact, sqlx::Error> {
        let timer = QueryTimer::new("ensure_user_profile");
        let entity = sqlx::query_as::<_, UserProfileEntity>(
            r#"
            INSERT INTO user_profiles (id, email)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE
            SET email = COALESCE(user_profiles.email, EXCLUDED.email)
            RETURNING id, email, display_name
            "#,
        )
        .bind(id)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        timer.record();
        Ok(entity.into())
    }
}
