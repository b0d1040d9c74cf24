//! `POST /send-email-notification`: transactional emails requested by the web client.

use axum::{body::Bytes, extract::State, Json};
use tracing::{info, warn};

use domain::models::{EmailMessage, SendEmailRequest, SendEmailResponse};

use crate::app::AppState;
use crate::error::{parse_function_body, FunctionError};
use crate::middleware::metrics::record_email_request;

pub async fn send_email_notification(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SendEmailResponse>, FunctionError> {
    let request: SendEmailRequest = parse_function_body(&body)?;

    let (Some(email_type), Some(user_email)) = (
        request.email_type.filter(|t| !t.is_empty()),
        request.user_email.filter(|e| !e.is_empty()),
    ) else {
        return Err(FunctionError::bad_request(
            "Missing required fields: type and userEmail",
        ));
    };
    let user_name = request
        .user_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| "User".to_string());

    let message = EmailMessage::from_request(&email_type, request.data).map_err(|e| {
        FunctionError::bad_request(format!("Invalid data for {} email: {}", email_type, e))
    })?;

    info!(email_type = %email_type, to = %user_email, "Sending transactional email");

    let rendered = state.email.render(&message, &user_name);
    if let Err(e) = state
        .email
        .send(&user_email, Some(&user_name), &rendered)
        .await
    {
        warn!(email_type = %email_type, error = %e, "Transactional email failed");
        record_email_request(message.kind(), false);
        return Err(FunctionError::bad_request(e.to_string()));
    }
    record_email_request(message.kind(), true);

    Ok(Json(SendEmailResponse {
        success: true,
        message: "Email sent successfully".to_string(),
        email_type,
        recipient: user_email,
    }))
}
