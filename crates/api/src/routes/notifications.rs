//! In-app notification endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use persistence::repositories::{NotificationPageQuery, NotificationRepository};
use shared::pagination::{decode_cursor, encode_cursor};
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use domain::models::notification::{
    ListNotificationsQuery, ListNotificationsResponse, MarkAllReadResponse, NotificationSummary,
    PaginationInfo,
};
use domain::models::Notification;

/// List the caller's notifications, newest first.
///
/// GET /api/v1/notifications?limit=&cursor=&unreadOnly=
pub async fn list_notifications(
    State(state): State<AppState>,
    auth: UserAuth,
    Query(query): Query<ListNotificationsQuery>,
) -> Result<Json<ListNotificationsResponse>, ApiError> {
    let after = query
        .cursor
        .as_deref()
        .map(decode_cursor)
        .transpose()
        .map_err(|_| ApiError::Validation("Invalid cursor".to_string()))?;

    let (notifications, has_more) = NotificationRepository::new(state.pool.clone())
        .list_for_user(NotificationPageQuery {
            user_id: auth.user_id,
            after,
            unread_only: query.unread_only,
            limit: query.effective_limit(),
        })
        .await?;

    let next_cursor = if has_more {
        notifications
            .last()
            .map(|n| encode_cursor(n.created_at, n.id))
    } else {
        None
    };

    Ok(Json(ListNotificationsResponse {
        notifications,
        pagination: PaginationInfo {
            next_cursor,
            has_more,
        },
    }))
}

/// GET /api/v1/notifications/summary
pub async fn notification_summary(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<NotificationSummary>, ApiError> {
    let summary = NotificationRepository::new(state.pool.clone())
        .summary(auth.user_id)
        .await?;
    Ok(Json(summary))
}

/// POST /api/v1/notifications/:notification_id/read
pub async fn mark_read(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<Notification>, ApiError> {
    let notification = NotificationRepository::new(state.pool.clone())
        .mark_read(auth.user_id, notification_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;
    Ok(Json(notification))
}

/// POST /api/v1/notifications/:notification_id/dismiss
pub async fn dismiss(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<Notification>, ApiError> {
    let notification = NotificationRepository::new(state.pool.clone())
        .dismiss(auth.user_id, notification_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;

    info!(
        notification_id = %notification.id,
        user_id = %auth.user_id,
        "Notification dismissed"
    );
    Ok(Json(notification))
}

/// POST /api/v1/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<MarkAllReadResponse>, ApiError> {
    let updated = NotificationRepository::new(state.pool.clone())
        .mark_all_read(auth.user_id)
        .await?;
    Ok(Json(MarkAllReadResponse { updated }))
}
