//! Integration tests for Shopfront.
//!
//! Each test spawns the full API router on an ephemeral port over a fresh
//! in-memory store and talks to it over HTTP, so no database is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopfront-integration-tests
//! ```
//!
//! # Test Files
//!
//! - `auth` - Registration, login and token checks
//! - `orders` - Placing, listing and cancelling orders
//! - `admin` - Role guard, catalog management, users and dashboard
//! - `health` - Health checks and response headers

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::path::PathBuf;

use reqwest::{Client, Response, StatusCode};
use secrecy::SecretString;
use serde_json::{Value, json};
use uuid::Uuid;

use shopfront_api::config::CorsOrigin;
use shopfront_api::db::{MemoryStore, Store};
use shopfront_api::routes;
use shopfront_api::services::auth::TokenSigner;
use shopfront_api::services::uploads::ImageStore;
use shopfront_api::state::AppState;

/// Signing secret shared by the server and tests that decode tokens.
pub const TEST_JWT_SECRET: &str = "t9#Kq2$wLx7!Vb4@Nm8&Rz1^Hc6*Pj3%";

/// Token signer using [`TEST_JWT_SECRET`].
#[must_use]
pub fn test_signer() -> TokenSigner {
    TokenSigner::new(&SecretString::from(TEST_JWT_SECRET.to_string()))
}

/// A running API server over an in-memory store.
pub struct TestApp {
    pub base_url: String,
    pub client: Client,
    /// The store behind the server, for assertions on stored state.
    pub store: MemoryStore,
    pub upload_dir: PathBuf,
    server: tokio::task::JoinHandle<()>,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.server.abort();
        let _ = std::fs::remove_dir_all(&self.upload_dir);
    }
}

impl TestApp {
    /// Start a server on `127.0.0.1` with an OS-assigned port.
    pub async fn spawn() -> Self {
        let store = MemoryStore::new();
        let upload_dir = std::env::temp_dir().join(format!("shopfront-test-{}", Uuid::new_v4()));

        let state = AppState::new(
            Store::from_memory(&store),
            test_signer(),
            ImageStore::new(upload_dir.clone()),
        );
        let app = routes::router(state, &CorsOrigin::Any);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            client: Client::new(),
            store,
            upload_dir,
            server,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Response {
        let mut request = self.client.get(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.unwrap()
    }

    pub async fn send_json(
        &self,
        method: reqwest::Method,
        path: &str,
        token: Option<&str>,
        body: &Value,
    ) -> Response {
        let mut request = self.client.request(method, self.url(path)).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.unwrap()
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: &Value) -> Response {
        self.send_json(reqwest::Method::POST, path, token, body).await
    }

    pub async fn put(&self, path: &str, token: Option<&str>, body: &Value) -> Response {
        self.send_json(reqwest::Method::PUT, path, token, body).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> Response {
        let mut request = self.client.delete(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.unwrap()
    }

    /// Register an account and return its token.
    pub async fn register(&self, name: &str, email: &str, password: &str, role: Option<&str>) -> String {
        let mut body = json!({ "name": name, "email": email, "password": password });
        if let Some(role) = role {
            body["role"] = json!(role);
        }
        let response = self.post("/api/auth/register", None, &body).await;
        assert_eq!(response.status(), StatusCode::OK);
        token_of(response).await
    }

    /// Register a shopper and return their token.
    pub async fn shopper(&self, email: &str) -> String {
        self.register("Shopper", email, "secret123", None).await
    }

    /// Register an admin and return their token.
    pub async fn admin(&self) -> String {
        self.register("Admin", "admin@shop.test", "secret123", Some("admin"))
            .await
    }

    /// Create a product through the admin API and return it.
    pub async fn create_product(&self, admin: &str, name: &str, price: f64) -> Value {
        let response = self
            .post(
                "/api/admin/products",
                Some(admin),
                &json!({ "name": name, "price": price, "category": "Coffee" }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        response.json().await.unwrap()
    }

    /// Place an order for one unit of `product_id` and return it.
    pub async fn place_order(&self, token: &str, product_id: &Value, total: f64) -> Value {
        let response = self
            .post(
                "/api/users/orders",
                Some(token),
                &json!({
                    "products": [{ "product": product_id, "name": "Snapshot", "price": total, "quantity": 1 }],
                    "total": total,
                }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        response.json().await.unwrap()
    }
}

/// Read `{"token": ...}` from a response.
pub async fn token_of(response: Response) -> String {
    let body: Value = response.json().await.unwrap();
    body["token"].as_str().unwrap().to_owned()
}

/// Read `{"message": ...}` from an error response.
pub async fn message_of(response: Response) -> String {
    let body: Value = response.json().await.unwrap();
    body["message"].as_str().unwrap().to_owned()
}
