//! Order placement, history and cancellation.
//!
//! Orders are recorded as sent: the total is the client's, line items are
//! stored as snapshots, and there is no stock check. Cancellation moves a
//! `pending` order to `cancelled`; cancelling a terminal order is a no-op
//! that returns it unchanged.

use std::collections::BTreeSet;

use serde::Deserialize;
use tracing::instrument;

use shopfront_core::{OrderId, Price, ProductId, UserId};

use crate::db::{OrderStore, ProductStore, UserStore};
use crate::error::{AppError, Result, or_not_found};
use crate::models::{LineItem, NewOrder, Order, OrderDetails, ResolvedLineItem, UserRef};

/// How many orders the admin dashboard shows.
pub const RECENT_ORDERS: i64 = 10;

/// Body of a place-order request.
#[derive(Debug, Deserialize)]
pub struct PlaceOrder {
    #[serde(default)]
    pub products: Vec<LineItem>,
    /// Must be a JSON number.
    #[serde(deserialize_with = "Price::deserialize_number")]
    pub total: Price,
}

/// Order operations for shoppers and admins.
pub struct OrderService<'a> {
    orders: &'a dyn OrderStore,
    users: &'a dyn UserStore,
    products: &'a dyn ProductStore,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(
        orders: &'a dyn OrderStore,
        users: &'a dyn UserStore,
        products: &'a dyn ProductStore,
    ) -> Self {
        Self {
            orders,
            users,
            products,
        }
    }

    /// Record a new `pending` order for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for an empty cart or a zero quantity.
    #[instrument(skip(self, request), fields(items = request.products.len()))]
    pub async fn place(&self, user_id: UserId, request: PlaceOrder) -> Result<Order> {
        if request.products.is_empty() {
            return Err(AppError::Validation(
                "Invalid products or total".to_string(),
            ));
        }
        if request.products.iter().any(|item| item.quantity == 0) {
            return Err(AppError::Validation(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let order = self
            .orders
            .create(NewOrder {
                user_id,
                products: request.products,
                total: request.total,
            })
            .await?;

        tracing::info!(order_id = %order.id, total = %order.total, "Order placed");
        Ok(order)
    }

    /// The user's orders, newest first, with products resolved.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    pub async fn history(&self, user_id: UserId) -> Result<Vec<OrderDetails>> {
        let orders = self.orders.list_for_user(user_id).await?;
        self.resolve(orders).await
    }

    /// Every order, newest first, with owners and products resolved.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    pub async fn all(&self) -> Result<Vec<OrderDetails>> {
        let orders = self.orders.list_all().await?;
        self.resolve(orders).await
    }

    /// The newest orders for the dashboard.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    pub async fn recent(&self) -> Result<Vec<OrderDetails>> {
        let orders = self.orders.list_recent(RECENT_ORDERS).await?;
        self.resolve(orders).await
    }

    /// Cancel an order on behalf of its owner.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown order and
    /// `AppError::Forbidden` if `user_id` does not own it.
    #[instrument(skip(self))]
    pub async fn cancel(&self, order_id: OrderId, user_id: UserId) -> Result<Order> {
        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        if order.user_id != user_id {
            return Err(AppError::Forbidden(
                "You are not authorized to cancel this order".to_string(),
            ));
        }

        if order.status.is_terminal() {
            return Ok(order);
        }

        self.transition_to_cancelled(order_id).await
    }

    /// Cancel any order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown order.
    #[instrument(skip(self))]
    pub async fn admin_cancel(&self, order_id: OrderId) -> Result<Order> {
        self.transition_to_cancelled(order_id).await
    }

    async fn transition_to_cancelled(&self, order_id: OrderId) -> Result<Order> {
        let order = self
            .orders
            .cancel(order_id)
            .await
            .map_err(or_not_found("Order"))?;
        tracing::info!(order_id = %order.id, status = %order.status, "Order cancel requested");
        Ok(order)
    }

    /// Attach owner names and current product details to orders.
    async fn resolve(&self, orders: Vec<Order>) -> Result<Vec<OrderDetails>> {
        let user_ids: Vec<UserId> = orders
            .iter()
            .map(|o| o.user_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let product_ids: Vec<ProductId> = orders
            .iter()
            .flat_map(|o| o.products.iter().map(|item| item.product))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let (names, summaries) = tokio::try_join!(
            self.users.names(&user_ids),
            self.products.summaries(&product_ids)
        )?;

        Ok(orders
            .into_iter()
            .map(|order| OrderDetails {
                id: order.id,
                user: UserRef {
                    id: order.user_id,
                    name: names.get(&order.user_id).cloned(),
                },
                products: order
                    .products
                    .into_iter()
                    .map(|item| ResolvedLineItem {
                        current: summaries.get(&item.product).cloned(),
                        item,
                    })
                    .collect(),
                total: order.total,
                status: order.status,
                created_at: order.created_at,
                updated_at: order.updated_at,
            })
            .collect())
    }
}
