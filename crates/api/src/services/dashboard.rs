//! Read-only aggregates for the admin dashboard.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::db::{OrderStore, ProductStore, UserStore};
use crate::error::Result;

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    /// Non-deleted accounts.
    pub users: i64,
    /// Orders in any status.
    pub orders: i64,
    /// Non-deleted products.
    pub products: i64,
    /// Sum of totals over orders that are not cancelled.
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
}

pub struct DashboardService<'a> {
    users: &'a dyn UserStore,
    products: &'a dyn ProductStore,
    orders: &'a dyn OrderStore,
}

impl<'a> DashboardService<'a> {
    #[must_use]
    pub const fn new(
        users: &'a dyn UserStore,
        products: &'a dyn ProductStore,
        orders: &'a dyn OrderStore,
    ) -> Self {
        Self {
            users,
            products,
            orders,
        }
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if any store query fails.
    pub async fn stats(&self) -> Result<DashboardStats> {
        let (users, orders, products, revenue) = tokio::try_join!(
            self.users.count_active(),
            self.orders.count(),
            self.products.count_active(),
            self.orders.revenue(),
        )?;

        Ok(DashboardStats {
            users,
            orders,
            products,
            revenue,
        })
    }
}
