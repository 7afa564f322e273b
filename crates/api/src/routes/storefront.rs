//! Shopper-facing catalog and order routes under `/api/users`.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use shopfront_core::OrderId;

use super::extract::{ApiJson, IdPath};
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::{Category, Order, OrderDetails, Product};
use crate::services::orders::PlaceOrder;
use crate::state::AppState;

/// `GET /api/users/categoriesForUser`
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.catalog().categories().await?))
}

/// `GET /api/users/products`
#[instrument(skip(state))]
pub async fn products(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.catalog().products().await?))
}

/// `GET /api/users/feature-products`
#[instrument(skip(state))]
pub async fn featured_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.catalog().featured_products().await?))
}

/// `POST /api/users/orders`
#[instrument(skip(state, body), fields(user_id = %user.id))]
pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(body): ApiJson<PlaceOrder>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = state.orders().place(user.id, body).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// `GET /api/users/orders/history`
#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn order_history(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<OrderDetails>>> {
    Ok(Json(state.orders().history(user.id).await?))
}

/// `PUT /api/users/orders/{id}/cancel`
#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn cancel_order(
    State(state): State<AppState>,
    user: AuthUser,
    IdPath(id): IdPath<OrderId>,
) -> Result<Json<Order>> {
    Ok(Json(state.orders().cancel(id, user.id).await?))
}
