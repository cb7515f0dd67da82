//! Database-backed tests for signup, login, refresh rotation and logout.

mod common;

use axum::http::StatusCode;
use common::{body_json, get_auth, post_json, post_json_auth};
use leaders_db::repositories::SessionRepo;
use serde_json::json;
use sqlx::PgPool;

async fn signup(app: axum::Router, email: &str) -> serde_json::Value {
    let body = json!({
        "email": email,
        "password": "long-enough-password",
        "display_name": "Mira Lane",
    });
    let response = post_json(app, "/api/auth/signup", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn signup_creates_a_creator_and_logs_in(pool: PgPool) {
    let app = common::build_test_app(pool);

    let json = signup(app.clone(), "Mira@Example.com").await;
    assert_eq!(json["user"]["role"], "creator");
    assert_eq!(json["user"]["email"], "mira@example.com");

    let response = post_json(
        app.clone(),
        "/api/auth/login",
        json!({ "email": "mira@example.com", "password": "long-enough-password" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let login = body_json(response).await;

    let me = get_auth(app, "/api/me", login["access_token"].as_str().unwrap()).await;
    assert_eq!(me.status(), StatusCode::OK);
    assert_eq!(body_json(me).await["data"]["display_name"], "Mira Lane");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_signup_is_409(pool: PgPool) {
    let app = common::build_test_app(pool);
    signup(app.clone(), "dup@example.com").await;

    let response = post_json(
        app,
        "/api/auth/signup",
        json!({
            "email": "dup@example.com",
            "password": "long-enough-password",
            "display_name": "Someone Else",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn wrong_password_is_401(pool: PgPool) {
    let app = common::build_test_app(pool);
    signup(app.clone(), "pw@example.com").await;

    let response = post_json(
        app,
        "/api/auth/login",
        json!({ "email": "pw@example.com", "password": "not-the-password" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn refresh_token_rotates_and_cannot_be_reused(pool: PgPool) {
    let app = common::build_test_app(pool);
    let json = signup(app.clone(), "rotate@example.com").await;
    let original = json["refresh_token"].as_str().unwrap().to_string();

    let response = post_json(
        app.clone(),
        "/api/auth/refresh",
        json!({ "refresh_token": original }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let rotated = body_json(response).await;
    assert_ne!(rotated["refresh_token"], json!(original));

    let replay = post_json(app, "/api/auth/refresh", json!({ "refresh_token": original })).await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn logout_revokes_refresh_tokens(pool: PgPool) {
    let app = common::build_test_app(pool);
    let json = signup(app.clone(), "bye@example.com").await;
    let access = json["access_token"].as_str().unwrap();

    let response = post_json_auth(app.clone(), "/api/auth/logout", access, json!({})).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let refresh = post_json(
        app,
        "/api/auth/refresh",
        json!({ "refresh_token": json["refresh_token"] }),
    )
    .await;
    assert_eq!(refresh.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn session_cleanup_removes_rotated_sessions_only(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let json = signup(app.clone(), "tidy@example.com").await;

    let response = post_json(
        app.clone(),
        "/api/auth/refresh",
        json!({ "refresh_token": json["refresh_token"] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let rotated = body_json(response).await;

    let deleted = SessionRepo::cleanup_expired(&pool).await.unwrap();
    assert_eq!(deleted, 1);
    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 1);

    // The live session survives.
    let again = post_json(
        app,
        "/api/auth/refresh",
        json!({ "refresh_token": rotated["refresh_token"] }),
    )
    .await;
    assert_eq!(again.status(), StatusCode::OK);
}
