//! Router-level contract tests that need no database: health reporting,
//! request ids, authentication, role gates and payload validation that
//! run before any query.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, get, get_auth, lazy_pool, post_json_auth, put_json_auth, token};
use serde_json::json;

#[tokio::test]
async fn health_reports_degraded_without_database() {
    let app = build_test_app(lazy_pool());
    let response = get(app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["db_healthy"], false);
    assert_eq!(json["push_enabled"], false);
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = build_test_app(lazy_pool());
    let response = get(app, "/api/does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() {
    for uri in ["/api/me", "/api/campaigns", "/api/payments", "/api/disputes"] {
        let response = get(build_test_app(lazy_pool()), uri).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn token_signed_with_another_secret_is_rejected() {
    let mut config = common::test_config();
    config.jwt.secret = "some-other-secret".into();
    let foreign = leaders_api::auth::jwt::generate_access_token(
        uuid::Uuid::new_v4(),
        "admin",
        &config.jwt,
    )
    .unwrap();

    let response = get_auth(build_test_app(lazy_pool()), "/api/me", &foreign).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_reject_other_roles() {
    let app = build_test_app(lazy_pool());
    let body = json!({ "user_ids": [uuid::Uuid::new_v4()] });

    for role in ["finance", "support", "brand_manager", "creator"] {
        let response =
            post_json_auth(app.clone(), "/api/admin/set-admins", &token(role), body.clone()).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{role}");
    }
}

#[tokio::test]
async fn create_brand_validates_before_writing() {
    let app = build_test_app(lazy_pool());
    let body = json!({
        "brand_name": "",
        "manager_name": "Dana Reyes",
        "manager_email": "not-an-email",
        "manager_password": "short",
    });

    let response = post_json_auth(app, "/api/admin/create-brand", &token("admin"), body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn set_admins_only_grants_staff_roles() {
    let app = build_test_app(lazy_pool());
    let body = json!({ "user_ids": [uuid::Uuid::new_v4()], "role": "creator" });

    let response = post_json_auth(app, "/api/admin/set-admins", &token("admin"), body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn payments_require_finance_role() {
    let app = build_test_app(lazy_pool());
    let uri = format!("/api/tasks/{}/payments", uuid::Uuid::new_v4());

    let response =
        post_json_auth(app, &uri, &token("brand_manager"), json!({ "amount_cents": 5000 })).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn dispute_resolution_requires_resolver_role() {
    let app = build_test_app(lazy_pool());
    let uri = format!("/api/disputes/{}/resolve", uuid::Uuid::new_v4());

    let response =
        post_json_auth(app, &uri, &token("finance"), json!({ "status": "resolved" })).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_status_is_rejected_before_lookup() {
    let app = build_test_app(lazy_pool());
    let uri = format!("/api/campaigns/{}/status", uuid::Uuid::new_v4());

    let response =
        post_json_auth(app, &uri, &token("admin"), json!({ "status": "launched" })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn notification_channels_are_validated() {
    let app = build_test_app(lazy_pool());

    let response = put_json_auth(
        app,
        "/api/notifications/preferences",
        &token("creator"),
        json!({ "channels": ["push", "sms"] }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn storage_paths_must_start_with_a_task_id() {
    let app = build_test_app(lazy_pool());

    let response = get_auth(
        app,
        "/api/storage/task-uploads/not-a-task/clip.mp4",
        &token("admin"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
