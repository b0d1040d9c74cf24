//! Stripe checkout, billing portal and webhook event handling.
//!
//! Talks to the Stripe REST API with form-encoded requests; no SDK.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use domain::models::SubscriptionUpsert;
use shared::signature::{verify_signature, WebhookSignatureError, DEFAULT_TOLERANCE_SECS};

use crate::config::StripeConfig;

#[derive(Debug, Error)]
pub enum StripeError {
    #[error("Stripe is not configured")]
    NotConfigured,

    #[error("Stripe request failed: {0}")]
    Request(String),

    #[error("Stripe API error: {0}")]
    Api(String),

    #[error("Stripe did not return a session URL")]
    MissingUrl,

    #[error("Invalid webhook signature: {0}")]
    Signature(#[from] WebhookSignatureError),

    #[error("Invalid webhook payload: {0}")]
    Payload(String),
}

/// A created Checkout or billing-portal session.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeSession {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

/// Parameters for a subscription Checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutParams<'a> {
    pub price_id: &'a str,
    pub user_id: Uuid,
    pub customer_email: Option<&'a str>,
    pub origin: &'a str,
}

#[derive(Clone)]
pub struct StripeClient {
    config: Arc<StripeConfig>,
    client: reqwest::Client,
}

impl StripeClient {
    /// Returns `None` when no secret key is configured.
    pub fn from_config(config: &StripeConfig) -> Option<Self> {
        if config.secret_key.trim().is_empty() {
            warn!("Stripe secret key not configured, billing endpoints disabled");
            return None;
        }

        let client = super::build_http_client(
            reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .user_agent("SmartSaver/1.0"),
            "stripe",
        );

        Some(Self {
            config: Arc::new(config.clone()),
            client,
        })
    }

    pub fn default_origin(&self) -> &str {
        &self.config.default_origin
    }

    /// Creates a subscription-mode Checkout session.
    pub async fn create_checkout_session(
        &self,
        params: CheckoutParams<'_>,
    ) -> Result<StripeSession, StripeError> {
        let user_id = params.user_id.to_string();
        let success_url = format!(
            "{}/success?session_id={{CHECKOUT_SESSION_ID}}",
            params.origin
        );
        let cancel_url = format!("{}/pricing", params.origin);

        let mut form: Vec<(&str, &str)> = vec![
            ("mode", "subscription"),
            ("line_items[0][price]", params.price_id),
            ("line_items[0][quantity]", "1"),
            ("success_url", &success_url),
            ("cancel_url", &cancel_url),
            ("billing_address_collection", "auto"),
            ("metadata[user_id]", &user_id),
            ("subscription_data[metadata][user_id]", &user_id),
            ("allow_promotion_codes", "true"),
            ("payment_method_types[0]", "card"),
        ];
        if let Some(email) = params.customer_email {
            form.push(("customer_email", email));
        }

        let session = self.post_form("checkout/sessions", &form).await?;
        info!(
            session_id = %session.id,
            user_id = %params.user_id,
            price_id = %params.price_id,
            "Created checkout session"
        );
        Ok(session)
    }

    /// Creates a billing-portal session returning to `{origin}/profile`.
    pub async fn create_portal_session(
        &self,
        customer_id: &str,
        origin: &str,
    ) -> Result<StripeSession, StripeError> {
        let return_url = format!("{}/profile", origin);
        let form = [("customer", customer_id), ("return_url", return_url.as_str())];
        self.post_form("billing_portal/sessions", &form).await
    }

    async fn post_form(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<StripeSession, StripeError> {
        let url = format!("{}/{}", self.config.api_base_url.trim_end_matches('/'), path);
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.secret_key)
            .header("Stripe-Version", &self.config.api_version)
            .form(form)
            .send()
            .await
            .map_err(|e| StripeError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<StripeErrorBody>(&body)
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or_else(|| format!("HTTP {}", status));
            error!(status = %status, path = %path, error = %message, "Stripe API error");
            return Err(StripeError::Api(message));
        }

        response
            .json::<StripeSession>()
            .await
            .map_err(|e| StripeError::Request(e.to_string()))
    }

    /// Verifies the `Stripe-Signature` header and parses the event.
    pub fn construct_event(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookEvent, StripeError> {
        construct_event(
            &self.config.webhook_secret,
            payload,
            signature_header,
            Utc::now().timestamp(),
        )
    }
}

/// Redirect origin: the `Origin` header, else scheme and host of `Referer`,
/// else the configured default.
pub fn resolve_origin(origin: Option<&str>, referer: Option<&str>, default: &str) -> String {
    if let Some(origin) = origin.filter(|o| !o.is_empty() && *o != "null") {
        return origin.trim_end_matches('/').to_string();
    }
    if let Some(referer) = referer {
        let parts: Vec<&str> = referer.split('/').take(3).collect();
        if parts.len() == 3 && !parts[2].is_empty() {
            return parts.join("/");
        }
    }
    default.trim_end_matches('/').to_string()
}

// ============================================================================
// Webhook events
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct CheckoutSessionObject {
    subscription: Option<String>,
    customer: Option<String>,
    #[serde(default)]
    metadata: Metadata,
}

#[derive(Debug, Deserialize)]
struct SubscriptionObject {
    id: String,
    customer: Option<String>,
    status: String,
    current_period_end: Option<i64>,
    #[serde(default)]
    cancel_at_period_end: bool,
    #[serde(default)]
    metadata: Metadata,
    items: Option<SubscriptionItems>,
}

#[derive(Debug, Default, Deserialize)]
struct Metadata {
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionItems {
    data: Vec<SubscriptionItem>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionItem {
    price: Option<Price>,
}

#[derive(Debug, Deserialize)]
struct Price {
    id: String,
}

/// Verifies and parses a webhook payload at unix time `now`.
pub fn construct_event(
    secret: &str,
    payload: &[u8],
    signature_header: &str,
    now: i64,
) -> Result<WebhookEvent, StripeError> {
    if secret.is_empty() {
        return Err(StripeError::NotConfigured);
    }
    verify_signature(secret, signature_header, payload, now, DEFAULT_TOLERANCE_SECS)?;
    serde_json::from_slice(payload).map_err(|e| StripeError::Payload(e.to_string()))
}

impl WebhookEvent {
    /// Subscription row to upsert for this event, if it is one we track.
    ///
    /// Events without a `user_id` in their metadata cannot be attributed and
    /// are skipped.
    pub fn subscription_upsert(&self) -> Result<Option<SubscriptionUpsert>, StripeError> {
        match self.event_type.as_str() {
            "checkout.session.completed" => {
                let session: CheckoutSessionObject = self.parse_object()?;
                let (Some(subscription_id), Some(user_id)) =
                    (session.subscription, parse_user_id(&session.metadata))
                else {
                    warn!(event_id = %self.id, "Checkout session without subscription or user");
                    return Ok(None);
                };
                Ok(Some(SubscriptionUpsert {
                    id: subscription_id,
                    user_id,
                    stripe_customer_id: session.customer,
                    price_id: None,
                    status: "active".to_string(),
                    current_period_end: None,
                    cancel_at_period_end: false,
                }))
            }
            "customer.subscription.updated" | "customer.subscription.deleted" => {
                let sub: SubscriptionObject = self.parse_object()?;
                let Some(user_id) = parse_user_id(&sub.metadata) else {
                    warn!(event_id = %self.id, subscription_id = %sub.id, "Subscription without user metadata");
                    return Ok(None);
                };
                let status = if self.event_type == "customer.subscription.deleted" {
                    "canceled".to_string()
                } else {
                    sub.status
                };
                let price_id = sub
                    .items
                    .and_then(|items| items.data.into_iter().next())
                    .and_then(|item| item.price)
                    .map(|price| price.id);
                Ok(Some(SubscriptionUpsert {
                    id: sub.id,
                    user_id,
                    stripe_customer_id: sub.customer,
                    price_id,
                    status,
                    current_period_end: sub
                        .current_period_end
                        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
                    cancel_at_period_end: sub.cancel_at_period_end,
                }))
            }
            _ => Ok(None),
        }
    }

    fn parse_object<T: serde::de::DeserializeOwned>(&self) -> Result<T, StripeError> {
        serde_json::from_value(self.data.object.clone())
            .map_err(|e| StripeError::Payload(e.to_string()))
    }
}

fn parse_user_id(metadata: &Metadata) -> Option<Uuid> {
    metadata
        .user_id
        .as_deref()
        .and_then(|id| Uuid::parse_str(id).ok())
}
