//! `POST /notification-engine`: runs the rule checks or writes test notifications.

use std::str::FromStr;

use axum::{body::Bytes, extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use domain::models::{Notification, NotificationType};
use domain::services::{CheckRunReport, EngineError};

use crate::app::AppState;
use crate::error::{parse_function_body, FunctionError};

/// Request body. `type` is `check_all`, `check_user` or `test_notification`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEngineRequest {
    #[serde(rename = "type")]
    pub request_type: String,
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub test_mode: bool,
    /// Rule type for test mode; absent writes one sample of each.
    pub notification_type: Option<NotificationType>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEngineResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<CheckRunReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<Vec<Notification>>,
}

enum EngineAction {
    Checks(Option<Uuid>),
    Test {
        user_id: Uuid,
        notification_type: Option<NotificationType>,
    },
}

impl NotificationEngineRequest {
    fn action(&self) -> Result<EngineAction, FunctionError> {
        if self.test_mode || self.request_type == "test_notification" {
            let user_id = self.user_id.ok_or_else(|| {
                FunctionError::bad_request("userId is required for test notifications")
            })?;
            // Older clients put the notification type in `type`.
            let notification_type = self
                .notification_type
                .or_else(|| NotificationType::from_str(&self.request_type).ok());
            return Ok(EngineAction::Test {
                user_id,
                notification_type,
            });
        }

        match self.request_type.as_str() {
            "check_all" => Ok(EngineAction::Checks(self.user_id)),
            "check_user" => self
                .user_id
                .map(|id| EngineAction::Checks(Some(id)))
                .ok_or_else(|| FunctionError::bad_request("userId is required for check_user")),
            other => Err(FunctionError::bad_request(format!(
                "Unsupported request type: {}",
                other
            ))),
        }
    }
}

pub async fn run_notification_engine(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<NotificationEngineResponse>, FunctionError> {
    let request: NotificationEngineRequest = parse_function_body(&body)?;

    info!(
        request_type = %request.request_type,
        user_id = ?request.user_id,
        test_mode = request.test_mode,
        "Processing notification check"
    );

    match request.action()? {
        EngineAction::Test {
            user_id,
            notification_type,
        } => {
            let created = state
                .engine
                .send_test_notifications(user_id, notification_type)
                .await
                .map_err(engine_error)?;
            Ok(Json(NotificationEngineResponse {
                success: true,
                message: "Test notification sent".to_string(),
                timestamp: None,
                report: None,
                notifications: Some(created),
            }))
        }
        EngineAction::Checks(user_id) => {
            let report = state.engine.run_checks(user_id).await;
            if report.all_failed() {
                warn!(
                    failed_checks = report.checks.len(),
                    "All notification checks failed"
                );
                return Ok(Json(NotificationEngineResponse {
                    success: false,
                    message: "All notification checks failed".to_string(),
                    timestamp: Some(report.completed_at),
                    report: Some(report),
                    notifications: None,
                }));
            }

            info!(
                created = report.total_created(),
                failed_checks = report.failed_checks().len(),
                "Notification checks completed"
            );
            Ok(Json(NotificationEngineResponse {
                success: true,
                message: "Notification checks completed".to_string(),
                timestamp: Some(report.completed_at),
                report: Some(report),
                notifications: None,
            }))
        }
    }
}

fn engine_error(err: EngineError) -> FunctionError {
    FunctionError::bad_request(err.to_string())
}
