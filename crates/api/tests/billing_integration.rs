//! Integration tests for the Stripe checkout, portal and webhook endpoints.
//!
//! None of these reach Stripe or the database: they cover authentication,
//! missing configuration and webhook signature handling.

mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::json;
use tokio_test::assert_ok;
use tower::ServiceExt;
use uuid::Uuid;

use common::{access_token, in_memory_app, parse_response_body, test_config, WEBHOOK_SECRET};
use domain::services::InMemoryNotificationStore;
use shared::signature::compute_signature;

fn app_with_webhook_secret(secret: &str) -> Router {
    let mut config = test_config();
    config.stripe.webhook_secret = secret.to_string();
    in_memory_app(config, Arc::new(InMemoryNotificationStore::new()))
}

fn webhook_request(payload: &str, signature: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/stripe-webhook")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(signature) = signature {
        builder = builder.header("stripe-signature", signature);
    }
    builder.body(Body::from(payload.to_string())).unwrap()
}

fn sign(payload: &str, timestamp: i64) -> String {
    let signature = compute_signature(WEBHOOK_SECRET, timestamp, payload.as_bytes());
    format!("t={},v1={}", timestamp, assert_ok!(signature))
}

// ============================================================================
// Checkout and portal
// ============================================================================

#[tokio::test]
async fn test_checkout_requires_authentication() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/create-checkout-session")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "priceId": "price_123" }).to_string()))
        .unwrap();

    let response = app_with_webhook_secret("").oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_checkout_unavailable_without_stripe_key() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/create-checkout-session")
        .header(header::CONTENT_TYPE, "application/json")
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", access_token(Uuid::new_v4())),
        )
        .body(Body::from(json!({ "priceId": "price_123" }).to_string()))
        .unwrap();

    let response = app_with_webhook_secret("").oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = parse_response_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "service_unavailable");
}

#[tokio::test]
async fn test_portal_unavailable_without_stripe_key() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/create-portal-session")
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", access_token(Uuid::new_v4())),
        )
        .body(Body::empty())
        .unwrap();

    let response = app_with_webhook_secret("").oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// ============================================================================
// Webhook
// ============================================================================

#[tokio::test]
async fn test_webhook_requires_signature_header() {
    let response = app_with_webhook_secret(WEBHOOK_SECRET)
        .oneshot(webhook_request("{}", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["message"], "Missing Stripe-Signature header");
}

#[tokio::test]
async fn test_webhook_unavailable_without_secret() {
    let payload = r#"{"id":"evt_1","type":"invoice.paid","data":{"object":{}}}"#;
    let now = chrono::Utc::now().timestamp();

    let response = app_with_webhook_secret("")
        .oneshot(webhook_request(payload, Some(sign(payload, now))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_webhook_rejects_bad_signature() {
    let payload = r#"{"id":"evt_1","type":"invoice.paid","data":{"object":{}}}"#;
    let now = chrono::Utc::now().timestamp();
    let tampered = r#"{"id":"evt_2","type":"invoice.paid","data":{"object":{}}}"#;

    let response = app_with_webhook_secret(WEBHOOK_SECRET)
        .oneshot(webhook_request(tampered, Some(sign(payload, now))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Webhook error"));
}

#[tokio::test]
async fn test_webhook_rejects_stale_timestamp() {
    let payload = r#"{"id":"evt_1","type":"invoice.paid","data":{"object":{}}}"#;
    let stale = chrono::Utc::now().timestamp() - 3600;

    let response = app_with_webhook_secret(WEBHOOK_SECRET)
        .oneshot(webhook_request(payload, Some(sign(payload, stale))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_acknowledges_untracked_event() {
    let payload = r#"{"id":"evt_1","type":"invoice.paid","data":{"object":{"id":"in_1"}}}"#;
    let now = chrono::Utc::now().timestamp();

    let response = app_with_webhook_secret(WEBHOOK_SECRET)
        .oneshot(webhook_request(payload, Some(sign(payload, now))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["received"], true);
}

#[tokio::test]
async fn test_webhook_acknowledges_event_without_user() {
    let payload = json!({
        "id": "evt_2",
        "type": "customer.subscription.updated",
        "data": { "object": {
            "id": "sub_1",
            "customer": "cus_1",
            "status": "active",
            "metadata": {}
        }}
    })
    .to_string();
    let now = chrono::Utc::now().timestamp();

    let response = app_with_webhook_secret(WEBHOOK_SECRET)
        .oneshot(webhook_request(&payload, Some(sign(&payload, now))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
