//! HTTP route handlers for the shopfront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                  - Liveness banner
//! GET  /health                            - Health check
//! GET  /health/ready                      - Store connectivity check
//! GET  /uploads/*                         - Uploaded images
//!
//! # Auth
//! POST /api/auth/register                 - Create account, returns token
//! POST /api/auth/login                    - Returns token
//! GET  /api/auth/me                       - Current user (auth)
//!
//! # Storefront
//! GET  /api/users/categoriesForUser       - Active categories
//! GET  /api/users/products                - Active products
//! GET  /api/users/feature-products        - Newest products
//! POST /api/users/orders                  - Place order (auth)
//! GET  /api/users/orders/history          - Own orders (auth)
//! PUT  /api/users/orders/{id}/cancel      - Cancel own order (auth)
//!
//! # Admin (auth + admin role)
//! GET  /api/admin/dashboard               - Welcome message
//! GET  /api/admin/dashboard/stats         - Totals and revenue
//! GET  /api/admin/dashboard/recent-orders - Newest orders
//! GET  /api/admin/users                   - Shopper accounts
//! PUT  /api/admin/users/{id}              - Edit account
//! DEL  /api/admin/users/{id}              - Soft delete account
//! GET  /api/admin/products                - List products
//! POST /api/admin/products                - Create product (JSON or multipart)
//! GET  /api/admin/products/{id}           - Fetch product
//! PUT  /api/admin/products/{id}           - Edit product (JSON or multipart)
//! DEL  /api/admin/products/{id}           - Soft delete product
//! GET  /api/admin/categories              - List categories
//! POST /api/admin/categories              - Create category (JSON or multipart)
//! PUT  /api/admin/categories/{id}         - Edit category (JSON or multipart)
//! DEL  /api/admin/categories/{id}         - Soft delete category
//! GET  /api/admin/orders                  - All orders
//! PUT  /api/admin/orders/{id}/cancel      - Cancel any order
//! ```

pub mod admin;
pub mod auth;
pub mod extract;
pub mod health;
pub mod storefront;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::CorsOrigin;
use crate::error::AppError;
use crate::middleware::{AdminUser, request_id_middleware, security_headers_middleware};
use crate::services::uploads::{MAX_IMAGE_BYTES, UPLOADS_PREFIX};
use crate::state::AppState;

/// Room for the multipart framing around the largest accepted image.
const ADMIN_BODY_LIMIT: usize = MAX_IMAGE_BYTES + 1024 * 1024;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
}

/// Create the shopper routes router.
pub fn storefront_routes() -> Router<AppState> {
    Router::new()
        .route("/categoriesForUser", get(storefront::categories))
        .route("/products", get(storefront::products))
        .route("/feature-products", get(storefront::featured_products))
        .route("/orders", post(storefront::place_order))
        .route("/orders/history", get(storefront::order_history))
        .route("/orders/{id}/cancel", put(storefront::cancel_order))
}

/// Create the admin routes router, guarded by the admin role.
pub fn admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(admin::welcome))
        .route("/dashboard/stats", get(admin::stats))
        .route("/dashboard/recent-orders", get(admin::recent_orders))
        .route("/users", get(admin::list_users))
        .route(
            "/users/{id}",
            put(admin::update_user).delete(admin::delete_user),
        )
        .route(
            "/products",
            get(admin::list_products).post(admin::create_product),
        )
        .route(
            "/products/{id}",
            get(admin::get_product)
                .put(admin::update_product)
                .delete(admin::delete_product),
        )
        .route(
            "/categories",
            get(admin::list_categories).post(admin::create_category),
        )
        .route(
            "/categories/{id}",
            put(admin::update_category).delete(admin::delete_category),
        )
        .route("/orders", get(admin::list_orders))
        .route("/orders/{id}/cancel", put(admin::cancel_order))
        .route_layer(middleware::from_extractor_with_state::<AdminUser, AppState>(
            state.clone(),
        ))
        .layer(DefaultBodyLimit::max(ADMIN_BODY_LIMIT))
}

/// Build the CORS layer for the configured origin policy.
fn cors_layer(origin: &CorsOrigin) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    match origin {
        CorsOrigin::Any => layer.allow_origin(Any),
        CorsOrigin::List(origins) => layer.allow_origin(AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )),
    }
}

async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

/// Build the complete application router.
///
/// Sentry layers are added by the binary so tests can drive this router
/// without a Sentry client.
pub fn router(state: AppState, cors: &CorsOrigin) -> Router {
    let uploads = ServeDir::new(state.images().dir());

    Router::new()
        .route("/", get(health::banner))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/auth", auth_routes())
        .nest("/api/users", storefront_routes())
        .nest("/api/admin", admin_routes(&state))
        .nest_service(UPLOADS_PREFIX, uploads)
        .fallback(not_found)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(cors_layer(cors))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}
