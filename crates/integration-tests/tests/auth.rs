//! Integration tests for registration, login and the current-user endpoint.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use shopfront_core::Role;
use shopfront_integration_tests::{TestApp, message_of, test_signer, token_of};

#[tokio::test]
async fn test_register_login_and_me() {
    let app = TestApp::spawn().await;
    app.register("Ada", "Ada@Example.com", "secret123", None).await;

    let response = app
        .post(
            "/api/auth/login",
            None,
            &json!({ "email": "ada@example.com", "password": "secret123" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let token = token_of(response).await;

    let response = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let me: Value = response.json().await.unwrap();
    assert_eq!(me["email"], "ada@example.com");
    assert_eq!(me["role"], "user");
    assert!(me.get("password").is_none());
    assert!(me.get("passwordHash").is_none());

    let claims = test_signer().verify(&token).unwrap();
    assert_eq!(claims.sub.to_string(), me["id"].to_string());
    assert_eq!(claims.role, Role::User);
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let app = TestApp::spawn().await;
    app.shopper("dup@example.com").await;

    let response = app
        .post(
            "/api/auth/register",
            None,
            &json!({ "name": "Again", "email": "DUP@example.com", "password": "secret123" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(message_of(response).await, "User already exists");
    assert_eq!(app.store.user_count().await, 1);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = TestApp::spawn().await;
    app.shopper("known@example.com").await;

    let wrong_password = app
        .post(
            "/api/auth/login",
            None,
            &json!({ "email": "known@example.com", "password": "not-it-123" }),
        )
        .await;
    let unknown_email = app
        .post(
            "/api/auth/login",
            None,
            &json!({ "email": "nobody@example.com", "password": "secret123" }),
        )
        .await;

    assert_eq!(wrong_password.status(), StatusCode::BAD_REQUEST);
    assert_eq!(unknown_email.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        message_of(wrong_password).await,
        message_of(unknown_email).await
    );
}

#[tokio::test]
async fn test_register_validation() {
    let app = TestApp::spawn().await;

    for body in [
        json!({ "name": "A", "email": "a@example.com", "password": "secret123" }),
        json!({ "name": "Ada", "email": "not-an-email", "password": "secret123" }),
        json!({ "name": "Ada", "email": "a@example.com", "password": "123" }),
        json!({ "name": "Ada", "email": "a@example.com", "password": "secret123", "role": "owner" }),
        json!({}),
    ] {
        let response = app.post("/api/auth/register", None, &body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        assert!(!message_of(response).await.is_empty());
    }
    assert_eq!(app.store.user_count().await, 0);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::spawn().await;
    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_me_requires_valid_token() {
    let app = TestApp::spawn().await;

    let response = app.get("/api/auth/me", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message_of(response).await, "No token, authorization denied");

    let response = app.get("/api/auth/me", Some("garbage")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message_of(response).await, "Token is not valid");
}

#[tokio::test]
async fn test_soft_deleted_user_cannot_log_in() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let token = app.shopper("gone@example.com").await;
    let id = test_signer().verify(&token).unwrap().sub;

    let response = app.delete(&format!("/api/admin/users/{id}"), Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .post(
            "/api/auth/login",
            None,
            &json!({ "email": "gone@example.com", "password": "secret123" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
