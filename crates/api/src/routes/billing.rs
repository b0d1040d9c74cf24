//! Stripe billing routes: checkout, customer portal and the webhook.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use serde::Serialize;
use tracing::{info, warn};
use validator::Validate;

use domain::models::subscription::{CheckoutRequest, CheckoutResponse, PortalResponse};
use persistence::repositories::{SubscriptionRepository, UserProfileRepository};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::record_webhook_event;
use crate::services::stripe::{self, resolve_origin, CheckoutParams};
use crate::services::{StripeClient, StripeError};

const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

impl From<StripeError> for ApiError {
    fn from(err: StripeError) -> Self {
        match err {
            StripeError::NotConfigured => {
                ApiError::ServiceUnavailable("Payment processing is not configured".to_string())
            }
            StripeError::Signature(e) => ApiError::BadRequest(format!("Webhook error: {}", e)),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

fn stripe_client(state: &AppState) -> Result<&StripeClient, ApiError> {
    state.stripe.as_ref().ok_or_else(|| StripeError::NotConfigured.into())
}

fn request_origin(headers: &HeaderMap, default: &str) -> String {
    let header_str = |name| headers.get(name).and_then(|v| v.to_str().ok());
    resolve_origin(header_str(header::ORIGIN), header_str(header::REFERER), default)
}

/// POST /create-checkout-session
pub async fn create_checkout_session(
    State(state): State<AppState>,
    auth: UserAuth,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let stripe = stripe_client(&state)?;
    let request: CheckoutRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::Validation(format!("Invalid request body: {}", e)))?;
    request.validate()?;

    let profile = UserProfileRepository::new(state.pool.clone())
        .ensure(auth.user_id, auth.email.as_deref())
        .await?;
    let origin = request_origin(&headers, stripe.default_origin());

    let session = stripe
        .create_checkout_session(CheckoutParams {
            price_id: &request.price_id,
            user_id: auth.user_id,
            customer_email: profile.email.as_deref(),
            origin: &origin,
        })
        .await?;
    let url = session.url.ok_or(StripeError::MissingUrl)?;

    Ok(Json(CheckoutResponse {
        url,
        session_id: session.id,
        success: true,
    }))
}

/// POST /create-portal-session
pub async fn create_portal_session(
    State(state): State<AppState>,
    auth: UserAuth,
    headers: HeaderMap,
) -> Result<Json<PortalResponse>, ApiError> {
    let stripe = stripe_client(&state)?;

    let customer_id = SubscriptionRepository::new(state.pool.clone())
        .find_customer_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("No active subscription found".to_string()))?;
    let origin = request_origin(&headers, stripe.default_origin());

    let session = stripe.create_portal_session(&customer_id, &origin).await?;
    let url = session.url.ok_or(StripeError::MissingUrl)?;

    info!(user_id = %auth.user_id, "Created billing portal session");
    Ok(Json(PortalResponse { url }))
}

/// POST /stripe-webhook
///
/// Verifies the signature over the raw body, then mirrors subscription
/// events into `subscriptions`. Untracked events are acknowledged and ignored.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("Missing Stripe-Signature header".to_string()))?;

    let event = stripe::construct_event(
        &state.config.stripe.webhook_secret,
        &body,
        signature,
        chrono::Utc::now().timestamp(),
    )
    .inspect_err(|e| warn!(error = %e, "Rejected Stripe webhook"))?;

    let Some(upsert) = event.subscription_upsert()? else {
        record_webhook_event(&event.event_type, "ignored");
        return Ok(Json(WebhookAck { received: true }));
    };

    UserProfileRepository::new(state.pool.clone())
        .ensure(upsert.user_id, None)
        .await?;
    let subscription = SubscriptionRepository::new(state.pool.clone())
        .upsert(&upsert)
        .await?;

    record_webhook_event(&event.event_type, "processed");
    info!(
        event_id = %event.id,
        event_type = %event.event_type,
        subscription_id = %subscription.id,
        status = %subscription.status,
        "Subscription updated from webhook"
    );
    Ok(Json(WebhookAck { received: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_request_origin_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::REFERER,
            HeaderValue::from_static("https://smartsaver.app/pricing"),
        );
        assert_eq!(
            request_origin(&headers, "http://localhost:5173"),
            "https://smartsaver.app"
        );

        headers.insert(header::ORIGIN, HeaderValue::from_static("https://beta.smartsaver.app"));
        assert_eq!(
            request_origin(&headers, "http://localhost:5173"),
            "https://beta.smartsaver.app"
        );
    }

    #[test]
    fn test_stripe_error_mapping() {
        assert!(matches!(
            ApiError::from(StripeError::NotConfigured),
            ApiError::ServiceUnavailable(_)
        ));
        assert!(matches!(
            ApiError::from(StripeError::Api("No such price".into())),
            ApiError::BadRequest(_)
        ));
    }
}
