//! User profile entity (database row mapping).

use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the user_profiles table.
#[derive(Debug, Clone, FromRow)]
pub struct UserProfileEntity {
    pub id: Uuid,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl From<UserProfileEntity> for domain::models::UserContact {
    fn from(entity: UserProfileEntity) -> Self {
        Self {
            id: entity.id,
            email: entity.email,
            display_name: entity.display_name,
        }
    }
}
