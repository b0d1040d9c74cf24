//! Integration tests for the notification and preference endpoints.
//!
//! Authentication failures are checked without a database. The CRUD flows
//! need PostgreSQL (`TEST_DATABASE_URL`) and are ignored by default.

mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use common::{
    access_token, cleanup_user, create_test_app, create_test_pool, get_request_with_auth,
    in_memory_app, json_post, json_request_with_auth, parse_response_body,
    post_request_with_auth, run_migrations, test_config,
};
use domain::services::InMemoryNotificationStore;

fn offline_app() -> axum::Router {
    in_memory_app(test_config(), Arc::new(InMemoryNotificationStore::new()))
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_list_requires_bearer_token() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/v1/notifications")
        .body(Body::empty())
        .unwrap();

    let response = offline_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = parse_response_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_invalid_token_is_rejected() {
    let response = offline_app()
        .oneshot(get_request_with_auth(
            "/api/v1/notification-preferences",
            "not-a-jwt",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let other = shared::jwt::JwtConfig::with_leeway(
        "a-completely-different-secret-value",
        Some(common::JWT_AUDIENCE.to_string()),
        0,
    )
    .unwrap();
    let token = other.issue_token(Uuid::new_v4(), None, 3600).unwrap();

    let response = offline_app()
        .oneshot(get_request_with_auth("/api/v1/notifications/summary", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bearer_routes_unavailable_without_jwt_secret() {
    let mut config = test_config();
    config.jwt.secret = String::new();
    let app = in_memory_app(config, Arc::new(InMemoryNotificationStore::new()));

    let response = app
        .oneshot(get_request_with_auth(
            "/api/v1/notifications",
            &access_token(Uuid::new_v4()),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "service_unavailable");
}

#[tokio::test]
async fn test_function_routes_do_not_require_auth() {
    let response = offline_app()
        .oneshot(json_post("/ai-financial-advisor", json!({ "message": "hi" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Database-backed flows
// ============================================================================

async fn seed_test_notifications(app: &axum::Router, user_id: Uuid) {
    let response = app
        .clone()
        .oneshot(json_post(
            "/notification-engine",
            json!({ "type": "test_notification", "userId": user_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_preferences_are_created_on_first_read() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;
    let app = create_test_app(test_config(), pool.clone());
    let user_id = Uuid::new_v4();
    let token = access_token(user_id);

    let response = app
        .clone()
        .oneshot(get_request_with_auth("/api/v1/notification-preferences", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["userId"], user_id.to_string());
    assert_eq!(body["emailEnabled"], true);
    assert_eq!(body["lowBalanceThreshold"], 100.0);
    assert_eq!(body["overspendingThresholdPercent"], 80);

    cleanup_user(&pool, user_id).await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_patch_preferences_updates_only_given_fields() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;
    let app = create_test_app(test_config(), pool.clone());
    let user_id = Uuid::new_v4();
    let token = access_token(user_id);

    let response = app
        .clone()
        .oneshot(json_request_with_auth(
            Method::PATCH,
            "/api/v1/notification-preferences",
            json!({ "lowBalanceThreshold": 250.0, "smsEnabled": true }),
            &token,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["lowBalanceThreshold"], 250.0);
    assert_eq!(body["smsEnabled"], true);
    assert_eq!(body["emailEnabled"], true);

    cleanup_user(&pool, user_id).await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_patch_preferences_validation() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;
    let app = create_test_app(test_config(), pool.clone());
    let user_id = Uuid::new_v4();
    let token = access_token(user_id);

    for body in [json!({}), json!({ "overspendingThresholdPercent": 150 })] {
        let response = app
            .clone()
            .oneshot(json_request_with_auth(
                Method::PATCH,
                "/api/v1/notification-preferences",
                body,
                &token,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = parse_response_body(response).await;
        assert_eq!(body["error"], "validation_error");
    }

    cleanup_user(&pool, user_id).await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_notification_inbox_flow() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;
    let app = create_test_app(test_config(), pool.clone());
    let user_id = Uuid::new_v4();
    let token = access_token(user_id);

    persistence::repositories::UserProfileRepository::new(pool.clone())
        .ensure(user_id, Some("inbox@example.com"))
        .await
        .unwrap();
    seed_test_notifications(&app, user_id).await;

    // First page of two, newest first.
    let response = app
        .clone()
        .oneshot(get_request_with_auth("/api/v1/notifications?limit=2", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page = parse_response_body(response).await;
    assert_eq!(page["notifications"].as_array().unwrap().len(), 2);
    assert_eq!(page["pagination"]["hasMore"], true);
    let cursor = page["pagination"]["nextCursor"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(get_request_with_auth(
            &format!("/api/v1/notifications?limit=10&cursor={}", cursor),
            &token,
        ))
        .await
        .unwrap();
    let rest = parse_response_body(response).await;
    assert_eq!(rest["notifications"].as_array().unwrap().len(), 2);
    assert_eq!(rest["pagination"]["hasMore"], false);

    // Summary counts the urgent suspicious-activity sample.
    let response = app
        .clone()
        .oneshot(get_request_with_auth("/api/v1/notifications/summary", &token))
        .await
        .unwrap();
    let summary = parse_response_body(response).await;
    assert_eq!(summary["unreadCount"], 4);
    assert_eq!(summary["urgentCount"], 1);

    // Mark one read, dismiss another.
    let first_id = page["notifications"][0]["id"].as_str().unwrap().to_string();
    let response = app
        .clone()
        .oneshot(post_request_with_auth(
            &format!("/api/v1/notifications/{}/read", first_id),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let read = parse_response_body(response).await;
    assert!(read["readAt"].is_string());

    let second_id = page["notifications"][1]["id"].as_str().unwrap().to_string();
    let response = app
        .clone()
        .oneshot(post_request_with_auth(
            &format!("/api/v1/notifications/{}/dismiss", second_id),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post_request_with_auth("/api/v1/notifications/read-all", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let all = parse_response_body(response).await;
    assert_eq!(all["updated"], 2);

    cleanup_user(&pool, user_id).await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_other_users_notification_is_not_found() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;
    let app = create_test_app(test_config(), pool.clone());
    let owner = Uuid::new_v4();
    let intruder = Uuid::new_v4();

    persistence::repositories::UserProfileRepository::new(pool.clone())
        .ensure(owner, None)
        .await
        .unwrap();
    seed_test_notifications(&app, owner).await;

    let response = app
        .clone()
        .oneshot(get_request_with_auth(
            "/api/v1/notifications",
            &access_token(owner),
        ))
        .await
        .unwrap();
    let page = parse_response_body(response).await;
    let id = page["notifications"][0]["id"].as_str().unwrap().to_string();

    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/v1/notifications/{}/read", id))
        .header(header::AUTHORIZATION, format!("Bearer {}", access_token(intruder)))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    cleanup_user(&pool, owner).await;
    cleanup_user(&pool, intruder).await;
}
