//! Billing subscription models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A Stripe subscription mirrored locally from webhook events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Stripe subscription id (`sub_...`).
    pub id: String,
    pub user_id: Uuid,
    pub stripe_customer_id: Option<String>,
    pub price_id: Option<String>,
    pub status: String,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        matches!(self.status.as_str(), "active" | "trialing")
    }
}

/// Upsert payload derived from a webhook event.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionUpsert {
    pub id: String,
    pub user_id: Uuid,
    pub stripe_customer_id: Option<String>,
    pub price_id: Option<String>,
    pub status: String,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
}

/// Request payload for `POST /create-checkout-session`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Price ID is required"))]
    pub price_id: String,
}

/// Response payload for `POST /create-checkout-session`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub url: String,
    pub session_id: String,
    pub success: bool,
}

/// Response payload for `POST /create-portal-session`.
#[derive(Debug, Clone, Serialize)]
pub struct PortalResponse {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_request_requires_price_id() {
        let req: CheckoutRequest = serde_json::from_str("{}").unwrap();
        assert!(req.validate().is_err());

        let req: CheckoutRequest = serde_json::from_str(r#"{"priceId":"price_123"}"#).unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_checkout_response_shape() {
        let json = serde_json::to_value(CheckoutResponse {
            url: "https://checkout.stripe.com/c/pay/cs_test".to_string(),
            session_id: "cs_test".to_string(),
            success: true,
        })
        .unwrap();
        assert_eq!(json["sessionId"], "cs_test");
        assert_eq!(json["success"], true);
    }

    #[test]
    fn test_subscription_is_active() {
        let mut sub = Subscription {
            id: "sub_1".to_string(),
            user_id: Uuid::nil(),
            stripe_customer_id: Some("cus_1".to_string()),
            price_id: None,
            status: "active".to_string(),
            current_period_end: None,
            cancel_at_period_end: false,
            updated_at: Utc::now(),
        };
        assert!(sub.is_active());
        sub.status = "trialing".to_string();
        assert!(sub.is_active());
        sub.status = "canceled".to_string();
        assert!(!sub.is_active());
    }
}
