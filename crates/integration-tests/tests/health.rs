//! Integration tests for health checks and cross-cutting response headers.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;

use shopfront_integration_tests::TestApp;

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::spawn().await;

    let response = app.get("/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "API is running...");

    let response = app.get("/health", None).await;
    assert_eq!(response.text().await.unwrap(), "ok");

    let response = app.get("/health/ready", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_api_response_headers() {
    let app = TestApp::spawn().await;
    let response = app.get("/api/users/products", None).await;

    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["referrer-policy"], "no-referrer");
    assert!(headers["cache-control"].to_str().unwrap().contains("no-store"));
    assert!(!headers["x-request-id"].is_empty());
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = TestApp::spawn().await;
    let response = app
        .client
        .get(app.url("/health"))
        .header("x-request-id", "req-123")
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-123");
}
