//! Integration tests for the function-style endpoints that need no database:
//! transactional email, the financial advisor, sync-account validation and
//! the liveness endpoint.

mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::json;
use tower::ServiceExt;

use common::{in_memory_app, json_post, parse_response_body, test_config};
use domain::services::InMemoryNotificationStore;

fn app() -> Router {
    in_memory_app(test_config(), Arc::new(InMemoryNotificationStore::new()))
}

// ============================================================================
// POST /send-email-notification
// ============================================================================

#[tokio::test]
async fn test_send_budget_alert_email() {
    let response = app()
        .oneshot(json_post(
            "/send-email-notification",
            json!({
                "type": "budget_alert",
                "userEmail": "saver@example.com",
                "userName": "Sam",
                "data": { "category": "Dining", "spent": 450.0, "budget": 400.0 }
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Email sent successfully");
    assert_eq!(body["type"], "budget_alert");
    assert_eq!(body["recipient"], "saver@example.com");
}

#[tokio::test]
async fn test_welcome_email_needs_no_data() {
    let response = app()
        .oneshot(json_post(
            "/send-email-notification",
            json!({ "type": "welcome", "userEmail": "new@example.com" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_email_type_uses_generic_template() {
    let response = app()
        .oneshot(json_post(
            "/send-email-notification",
            json!({ "type": "newsletter", "userEmail": "reader@example.com" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_email_missing_fields() {
    for body in [
        json!({ "userEmail": "a@example.com" }),
        json!({ "type": "welcome" }),
        json!({ "type": "", "userEmail": "a@example.com" }),
    ] {
        let response = app()
            .oneshot(json_post("/send-email-notification", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = parse_response_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Missing required fields: type and userEmail");
    }
}

#[tokio::test]
async fn test_email_with_bad_template_data() {
    let response = app()
        .oneshot(json_post(
            "/send-email-notification",
            json!({
                "type": "expense_added",
                "userEmail": "saver@example.com",
                "data": { "category": "Travel" }
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid data for expense_added email"));
}

#[tokio::test]
async fn test_email_to_implausible_address() {
    let response = app()
        .oneshot(json_post(
            "/send-email-notification",
            json!({ "type": "welcome", "userEmail": "not-an-address" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "Invalid email address: not-an-address");
}

// ============================================================================
// POST /ai-financial-advisor
// ============================================================================

#[tokio::test]
async fn test_advisor_spending_analysis() {
    let response = app()
        .oneshot(json_post(
            "/ai-financial-advisor",
            json!({
                "message": "Can you analyze my spending?",
                "income": 4000.0,
                "expenses": [
                    { "amount": 1200.0, "category": "Housing" },
                    { "amount": 300.0, "category": "Dining" },
                    { "amount": 150.0, "category": "Transport" }
                ]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    let advice = body["advice"].as_str().unwrap();
    assert!(advice.contains("1. Housing: $1200.00"));
}

#[tokio::test]
async fn test_advisor_without_expenses() {
    let response = app()
        .oneshot(json_post("/ai-financial-advisor", json!({ "message": "hello" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert!(!body["advice"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_advisor_requires_message() {
    let response = app()
        .oneshot(json_post("/ai-financial-advisor", json!({ "expenses": [] })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// POST /sync-account
// ============================================================================

#[tokio::test]
async fn test_sync_account_requires_account_id() {
    let response = app()
        .oneshot(json_post("/sync-account", json!({ "syncType": "full" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Account ID is required");
}

#[tokio::test]
async fn test_sync_account_rejects_unknown_sync_type() {
    let response = app()
        .oneshot(json_post(
            "/sync-account",
            json!({ "accountId": uuid::Uuid::new_v4(), "syncType": "everything" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_liveness_endpoint() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/health/live")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "alive");
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let response = app()
        .oneshot(json_post("/ai-financial-advisor", json!({ "message": "hi" })))
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}
