//! Notification preference endpoint handlers.

use axum::{extract::State, Json};
use persistence::repositories::{NotificationPreferencesRepository, UserProfileRepository};
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use domain::models::{NotificationPreferences, UpdatePreferencesRequest};

/// Returns the caller's preferences, creating the defaults on first access.
///
/// GET /api/v1/notification-preferences
pub async fn get_preferences(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<NotificationPreferences>, ApiError> {
    UserProfileRepository::new(state.pool.clone())
        .ensure(auth.user_id, auth.email.as_deref())
        .await?;
    let prefs = NotificationPreferencesRepository::new(state.pool.clone())
        .get_or_create(auth.user_id)
        .await?;
    Ok(Json(prefs))
}

/// Partially updates the caller's preferences.
///
/// PATCH /api/v1/notification-preferences
pub async fn update_preferences(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<UpdatePreferencesRequest>,
) -> Result<Json<NotificationPreferences>, ApiError> {
    request.validate()?;
    if request.is_empty() {
        return Err(ApiError::Validation(
            "At least one preference must be provided".to_string(),
        ));
    }

    UserProfileRepository::new(state.pool.clone())
        .ensure(auth.user_id, auth.email.as_deref())
        .await?;
    let prefs = NotificationPreferencesRepository::new(state.pool.clone())
        .update(auth.user_id, &request)
        .await?;

    info!(user_id = %auth.user_id, "Notification preferences updated");
    Ok(Json(prefs))
}
