//! Persistence for users, the catalog and orders.
//!
//! # Database: `shopfront`
//!
//! ## Tables (schema `shop`)
//!
//! - `users` - Accounts (unique email, role, soft-delete flag)
//! - `categories` - Storefront categories (soft-delete flag)
//! - `products` - Products for sale (soft-delete flag)
//! - `orders` - Orders with their line items as a `JSONB` array
//!
//! # Store traits
//!
//! Services talk to the [`Store`] bundle, never to a pool directly. Each
//! entity has a trait ([`UserStore`], [`CategoryStore`], [`ProductStore`],
//! [`OrderStore`]) with a `PostgreSQL` implementation in this module tree and
//! an in-memory one in [`memory`].
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p shopfront-cli -- migrate
//! ```

pub mod categories;
pub mod memory;
pub mod orders;
pub mod products;
pub mod users;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use shopfront_core::{CategoryId, Email, OrderId, ProductId, UserId};

use crate::models::{
    Category, CategoryUpdate, NewCategory, NewOrder, NewProduct, NewUser, Order, Product,
    ProductSummary, ProductUpdate, User, UserUpdate,
};

pub use categories::PgCategoryRepository;
pub use memory::MemoryStore;
pub use orders::PgOrderRepository;
pub use products::PgProductRepository;
pub use users::PgUserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique-constraint violation to `RepositoryError::Conflict`.
pub(crate) fn conflict_on_unique(message: &'static str) -> impl FnOnce(sqlx::Error) -> RepositoryError {
    move |e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return RepositoryError::Conflict(message.to_owned());
        }
        RepositoryError::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

// =============================================================================
// Store traits
// =============================================================================

/// Account storage.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new account.
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken.
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;

    /// Look up an account and its password hash by email, including
    /// soft-deleted accounts.
    async fn find_credentials(&self, email: &Email)
    -> Result<Option<(User, String)>, RepositoryError>;

    /// Look up an account by id, including soft-deleted accounts.
    async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Non-deleted accounts with the `user` role, newest first.
    async fn list_customers(&self) -> Result<Vec<User>, RepositoryError>;

    /// Apply a partial update to a live account.
    ///
    /// Returns `NotFound` for unknown or deleted ids and `Conflict` if the
    /// new email is taken.
    async fn update(&self, id: UserId, update: UserUpdate) -> Result<User, RepositoryError>;

    /// Mark a live account deleted.
    async fn soft_delete(&self, id: UserId) -> Result<User, RepositoryError>;

    /// Number of non-deleted accounts.
    async fn count_active(&self) -> Result<i64, RepositoryError>;

    /// Display names for the given ids. Unknown ids are absent from the map.
    async fn names(&self, ids: &[UserId]) -> Result<HashMap<UserId, String>, RepositoryError>;
}

/// Category storage.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Non-deleted categories in creation order.
    async fn list_active(&self) -> Result<Vec<Category>, RepositoryError>;

    async fn get_active(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError>;

    async fn create(&self, category: NewCategory) -> Result<Category, RepositoryError>;

    /// Returns `NotFound` for unknown or deleted ids.
    async fn update(
        &self,
        id: CategoryId,
        update: CategoryUpdate,
    ) -> Result<Category, RepositoryError>;

    /// Returns `NotFound` for unknown or already deleted ids.
    async fn soft_delete(&self, id: CategoryId) -> Result<Category, RepositoryError>;
}

/// Product storage.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Non-deleted products, newest first.
    async fn list_active(&self) -> Result<Vec<Product>, RepositoryError>;

    /// The `limit` most recently created non-deleted products, newest first.
    async fn list_featured(&self, limit: i64) -> Result<Vec<Product>, RepositoryError>;

    async fn get_active(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError>;

    /// Returns `NotFound` for unknown or deleted ids.
    async fn update(&self, id: ProductId, update: ProductUpdate)
    -> Result<Product, RepositoryError>;

    /// Returns `NotFound` for unknown or already deleted ids.
    async fn soft_delete(&self, id: ProductId) -> Result<Product, RepositoryError>;

    /// Number of non-deleted products.
    async fn count_active(&self) -> Result<i64, RepositoryError>;

    /// Current details for the given ids, deleted products included.
    async fn summaries(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, ProductSummary>, RepositoryError>;
}

/// Order storage.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert a new order with status `pending`.
    async fn create(&self, order: NewOrder) -> Result<Order, RepositoryError>;

    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Orders owned by `user_id`, newest first.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError>;

    /// Every order, newest first.
    async fn list_all(&self) -> Result<Vec<Order>, RepositoryError>;

    /// The `limit` newest orders.
    async fn list_recent(&self, limit: i64) -> Result<Vec<Order>, RepositoryError>;

    /// Move a `pending` order to `cancelled` in one conditional write.
    ///
    /// An order that is already terminal is returned unchanged. Returns
    /// `NotFound` for unknown ids.
    async fn cancel(&self, id: OrderId) -> Result<Order, RepositoryError>;

    /// Number of orders in any status.
    async fn count(&self) -> Result<i64, RepositoryError>;

    /// Sum of totals over orders that are not cancelled.
    async fn revenue(&self) -> Result<Decimal, RepositoryError>;
}

// =============================================================================
// Store bundle
// =============================================================================

/// Handles to every store, shared by all requests.
#[derive(Clone)]
pub struct Store {
    pub users: Arc<dyn UserStore>,
    pub categories: Arc<dyn CategoryStore>,
    pub products: Arc<dyn ProductStore>,
    pub orders: Arc<dyn OrderStore>,
    pool: Option<PgPool>,
}

impl Store {
    /// Stores backed by `PostgreSQL`.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            categories: Arc::new(PgCategoryRepository::new(pool.clone())),
            products: Arc::new(PgProductRepository::new(pool.clone())),
            orders: Arc::new(PgOrderRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Stores backed by a fresh, empty [`MemoryStore`].
    #[must_use]
    pub fn memory() -> Self {
        Self::from_memory(&MemoryStore::new())
    }

    /// Stores sharing the given [`MemoryStore`].
    #[must_use]
    pub fn from_memory(memory: &MemoryStore) -> Self {
        Self {
            users: Arc::new(memory.clone()),
            categories: Arc::new(memory.clone()),
            products: Arc::new(memory.clone()),
            orders: Arc::new(memory.clone()),
            pool: None,
        }
    }

    /// The underlying pool, if backed by `PostgreSQL`.
    #[must_use]
    pub const fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    /// Check that the backing database answers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the ping query fails.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}
