//! Admin routes under `/api/admin`.
//!
//! Every route here sits behind the [`AdminUser`](crate::middleware::AdminUser)
//! guard installed by [`super::router`].

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use serde_json::json;
use tracing::instrument;

use shopfront_core::{CategoryId, OrderId, ProductId, UserId};

use super::extract::{ApiJson, CatalogPayload, IdPath};
use crate::error::Result;
use crate::models::{Category, Order, OrderDetails, Product, User};
use crate::services::catalog::{CategoryForm, ProductForm};
use crate::services::dashboard::DashboardStats;
use crate::services::users::UserForm;
use crate::state::AppState;

/// Confirmation body for a user soft delete.
#[derive(Debug, Serialize)]
pub struct UserDeleted {
    pub message: &'static str,
    pub user: User,
}

/// Plain `{"message": ...}` confirmation.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

// =============================================================================
// Dashboard
// =============================================================================

/// `GET /api/admin/dashboard`
pub async fn welcome() -> Json<serde_json::Value> {
    Json(json!({ "message": "Welcome to the admin dashboard" }))
}

/// `GET /api/admin/dashboard/stats`
#[instrument(skip(state))]
pub async fn stats(State(state): State<AppState>) -> Result<Json<DashboardStats>> {
    Ok(Json(state.dashboard().stats().await?))
}

/// `GET /api/admin/dashboard/recent-orders`
#[instrument(skip(state))]
pub async fn recent_orders(State(state): State<AppState>) -> Result<Json<Vec<OrderDetails>>> {
    Ok(Json(state.orders().recent().await?))
}

// =============================================================================
// Users
// =============================================================================

/// `GET /api/admin/users`
#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>> {
    Ok(Json(state.user_admin().list().await?))
}

/// `PUT /api/admin/users/{id}`
#[instrument(skip(state, form))]
pub async fn update_user(
    State(state): State<AppState>,
    IdPath(id): IdPath<UserId>,
    ApiJson(form): ApiJson<UserForm>,
) -> Result<Json<User>> {
    Ok(Json(state.user_admin().update(id, form).await?))
}

/// `DELETE /api/admin/users/{id}`
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    IdPath(id): IdPath<UserId>,
) -> Result<Json<UserDeleted>> {
    let user = state.user_admin().soft_delete(id).await?;
    Ok(Json(UserDeleted {
        message: "User soft deleted",
        user,
    }))
}

// =============================================================================
// Products
// =============================================================================

/// `GET /api/admin/products`
#[instrument(skip(state))]
pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.catalog().products().await?))
}

/// `GET /api/admin/products/{id}`
#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    IdPath(id): IdPath<ProductId>,
) -> Result<Json<Product>> {
    Ok(Json(state.catalog().product(id).await?))
}

/// `POST /api/admin/products`
#[instrument(skip_all)]
pub async fn create_product(
    State(state): State<AppState>,
    payload: CatalogPayload<ProductForm>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = state
        .catalog()
        .create_product(payload.form, payload.image)
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// `PUT /api/admin/products/{id}`
#[instrument(skip(state, payload))]
pub async fn update_product(
    State(state): State<AppState>,
    IdPath(id): IdPath<ProductId>,
    payload: CatalogPayload<ProductForm>,
) -> Result<Json<Product>> {
    Ok(Json(
        state
            .catalog()
            .update_product(id, payload.form, payload.image)
            .await?,
    ))
}

/// `DELETE /api/admin/products/{id}`
///
/// Soft delete; responds with the flagged product.
#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    IdPath(id): IdPath<ProductId>,
) -> Result<Json<Product>> {
    Ok(Json(state.catalog().delete_product(id).await?))
}

// =============================================================================
// Categories
// =============================================================================

/// `GET /api/admin/categories`
#[instrument(skip(state))]
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.catalog().categories().await?))
}

/// `POST /api/admin/categories`
#[instrument(skip_all)]
pub async fn create_category(
    State(state): State<AppState>,
    payload: CatalogPayload<CategoryForm>,
) -> Result<(StatusCode, Json<Category>)> {
    let category = state
        .catalog()
        .create_category(payload.form, payload.image)
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// `PUT /api/admin/categories/{id}`
#[instrument(skip(state, payload))]
pub async fn update_category(
    State(state): State<AppState>,
    IdPath(id): IdPath<CategoryId>,
    payload: CatalogPayload<CategoryForm>,
) -> Result<Json<Category>> {
    Ok(Json(
        state
            .catalog()
            .update_category(id, payload.form, payload.image)
            .await?,
    ))
}

/// `DELETE /api/admin/categories/{id}`
#[instrument(skip(state))]
pub async fn delete_category(
    State(state): State<AppState>,
    IdPath(id): IdPath<CategoryId>,
) -> Result<Json<Message>> {
    state.catalog().delete_category(id).await?;
    Ok(Json(Message {
        message: "Category deleted",
    }))
}

// =============================================================================
// Orders
// =============================================================================

/// `GET /api/admin/orders`
#[instrument(skip(state))]
pub async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<OrderDetails>>> {
    Ok(Json(state.orders().all().await?))
}

/// `PUT /api/admin/orders/{id}/cancel`
#[instrument(skip(state))]
pub async fn cancel_order(
    State(state): State<AppState>,
    IdPath(id): IdPath<OrderId>,
) -> Result<Json<Order>> {
    Ok(Json(state.orders().admin_cancel(id).await?))
}
