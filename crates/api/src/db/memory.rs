//! In-memory store.
//!
//! Implements every store trait over hash maps behind a single
//! [`tokio::sync::RwLock`]. Used by the test suites and for running the API
//! without a database. Ids are assigned sequentially per table, like
//! `SERIAL` columns.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use shopfront_core::{CategoryId, Email, OrderId, OrderStatus, ProductId, UserId};

use super::{CategoryStore, OrderStore, ProductStore, RepositoryError, UserStore};
use crate::models::{
    Category, CategoryUpdate, NewCategory, NewOrder, NewProduct, NewUser, Order, Product,
    ProductSummary, ProductUpdate, User, UserUpdate,
};

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, (User, String)>,
    categories: BTreeMap<CategoryId, Category>,
    products: BTreeMap<ProductId, Product>,
    orders: BTreeMap<OrderId, Order>,
    next_user: i32,
    next_category: i32,
    next_product: i32,
    next_order: i32,
}

fn next(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

/// Newest first, highest id breaking ties.
fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, i32)) {
    items.sort_by_key(|item| std::cmp::Reverse(key(item)));
}

fn take(items: Vec<Order>, limit: i64) -> Vec<Order> {
    let limit = usize::try_from(limit).unwrap_or(0);
    items.into_iter().take(limit).collect()
}

/// Store backed by process memory. Cloning shares the same tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Force an order into a status, as fulfilment outside the API would.
    ///
    /// Returns `false` if the order does not exist.
    pub async fn set_order_status(&self, id: OrderId, status: OrderStatus) -> bool {
        let mut tables = self.tables.write().await;
        match tables.orders.get_mut(&id) {
            Some(order) => {
                order.status = status;
                order.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Number of stored accounts, deleted ones included.
    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }

    /// Number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|(u, _)| u.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let now = Utc::now();
        let id = UserId::new(next(&mut tables.next_user));
        let created = User {
            id,
            name: user.name,
            email: user.email,
            role: user.role,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        tables
            .users
            .insert(id, (created.clone(), user.password_hash));
        Ok(created)
    }

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|(u, _)| &u.email == email)
            .cloned())
    }

    async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).map(|(u, _)| u.clone()))
    }

    async fn list_customers(&self) -> Result<Vec<User>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables
            .users
            .values()
            .map(|(u, _)| u)
            .filter(|u| !u.is_deleted && !u.role.is_admin())
            .cloned()
            .collect();
        newest_first(&mut users, |u| (u.created_at, u.id.as_i32()));
        Ok(users)
    }

    async fn update(&self, id: UserId, update: UserUpdate) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;

        if let Some(email) = &update.email
            && tables
                .users
                .values()
                .any(|(u, _)| u.id != id && &u.email == email)
        {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let (user, _) = tables
            .users
            .get_mut(&id)
            .filter(|(u, _)| !u.is_deleted)
            .ok_or(RepositoryError::NotFound)?;

        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn soft_delete(&self, id: UserId) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        let (user, _) = tables
            .users
            .get_mut(&id)
            .filter(|(u, _)| !u.is_deleted)
            .ok_or(RepositoryError::NotFound)?;
        user.is_deleted = true;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn count_active(&self) -> Result<i64, RepositoryError> {
        let tables = self.tables.read().await;
        let count = tables.users.values().filter(|(u, _)| !u.is_deleted).count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn names(&self, ids: &[UserId]) -> Result<HashMap<UserId, String>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.users.get(id).map(|(u, _)| (*id, u.name.clone())))
            .collect())
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn list_active(&self) -> Result<Vec<Category>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .categories
            .values()
            .filter(|c| !c.is_deleted)
            .cloned()
            .collect())
    }

    async fn get_active(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.categories.get(&id).filter(|c| !c.is_deleted).cloned())
    }

    async fn create(&self, category: NewCategory) -> Result<Category, RepositoryError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let id = CategoryId::new(next(&mut tables.next_category));
        let created = Category {
            id,
            name: category.name,
            description: category.description,
            image: category.image,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        tables.categories.insert(id, created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        id: CategoryId,
        update: CategoryUpdate,
    ) -> Result<Category, RepositoryError> {
        let mut tables = self.tables.write().await;
        let category = tables
            .categories
            .get_mut(&id)
            .filter(|c| !c.is_deleted)
            .ok_or(RepositoryError::NotFound)?;

        if let Some(name) = update.name {
            category.name = name;
        }
        if let Some(description) = update.description {
            category.description = Some(description);
        }
        if let Some(image) = update.image {
            category.image = Some(image);
        }
        category.updated_at = Utc::now();
        Ok(category.clone())
    }

    async fn soft_delete(&self, id: CategoryId) -> Result<Category, RepositoryError> {
        let mut tables = self.tables.write().await;
        let category = tables
            .categories
            .get_mut(&id)
            .filter(|c| !c.is_deleted)
            .ok_or(RepositoryError::NotFound)?;
        category.is_deleted = true;
        category.updated_at = Utc::now();
        Ok(category.clone())
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn list_active(&self) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut products: Vec<Product> = tables
            .products
            .values()
            .filter(|p| !p.is_deleted)
            .cloned()
            .collect();
        newest_first(&mut products, |p| (p.created_at, p.id.as_i32()));
        Ok(products)
    }

    async fn list_featured(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let limit = usize::try_from(limit).unwrap_or(0);
        let mut products = ProductStore::list_active(self).await?;
        products.truncate(limit);
        Ok(products)
    }

    async fn get_active(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.products.get(&id).filter(|p| !p.is_deleted).cloned())
    }

    async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let id = ProductId::new(next(&mut tables.next_product));
        let created = Product {
            id,
            name: product.name,
            price: product.price,
            category: product.category,
            image: product.image,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        tables.products.insert(id, created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        let mut tables = self.tables.write().await;
        let product = tables
            .products
            .get_mut(&id)
            .filter(|p| !p.is_deleted)
            .ok_or(RepositoryError::NotFound)?;

        if let Some(name) = update.name {
            product.name = name;
        }
        if let Some(price) = update.price {
            product.price = price;
        }
        if let Some(category) = update.category {
            product.category = Some(category);
        }
        if let Some(image) = update.image {
            product.image = Some(image);
        }
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn soft_delete(&self, id: ProductId) -> Result<Product, RepositoryError> {
        let mut tables = self.tables.write().await;
        let product = tables
            .products
            .get_mut(&id)
            .filter(|p| !p.is_deleted)
            .ok_or(RepositoryError::NotFound)?;
        product.is_deleted = true;
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn count_active(&self) -> Result<i64, RepositoryError> {
        let tables = self.tables.read().await;
        let count = tables.products.values().filter(|p| !p.is_deleted).count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn summaries(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, ProductSummary>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.products.get(id).map(|p| (*id, p.summary())))
            .collect())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let id = OrderId::new(next(&mut tables.next_order));
        let created = Order {
            id,
            user_id: order.user_id,
            products: order.products,
            total: order.total,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        tables.orders.insert(id, created.clone());
        Ok(created)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.orders.get(&id).cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut orders: Vec<Order> = tables
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut orders, |o| (o.created_at, o.id.as_i32()));
        Ok(orders)
    }

    async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut orders: Vec<Order> = tables.orders.values().cloned().collect();
        newest_first(&mut orders, |o| (o.created_at, o.id.as_i32()));
        Ok(orders)
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Order>, RepositoryError> {
        let orders = OrderStore::list_all(self).await?;
        Ok(take(orders, limit))
    }

    async fn cancel(&self, id: OrderId) -> Result<Order, RepositoryError> {
        let mut tables = self.tables.write().await;
        let order = tables.orders.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        if let Some(next_status) = order.status.cancel() {
            order.status = next_status;
            order.updated_at = Utc::now();
        }
        Ok(order.clone())
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(i64::try_from(tables.orders.len()).unwrap_or(i64::MAX))
    }

    async fn revenue(&self) -> Result<Decimal, RepositoryError> {
        let tables = self.tables.read().await;
        tables
            .orders
            .values()
            .filter(|o| o.status.counts_as_revenue())
            .try_fold(Decimal::ZERO, |sum, o| sum.checked_add(o.total.amount()))
            .ok_or_else(|| RepositoryError::DataCorruption("revenue out of range".to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shopfront_core::{Price, Role};

    use super::*;
    use crate::models::LineItem;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Test".to_string(),
            email: Email::parse(email).unwrap(),
            password_hash: "hash".to_string(),
            role: Role::User,
        }
    }

    fn new_order(user_id: UserId, total: &str) -> NewOrder {
        NewOrder {
            user_id,
            products: vec![LineItem {
                product: ProductId::new(1),
                name: None,
                price: None,
                quantity: 1,
                image: None,
                category: None,
            }],
            total: total.parse::<Price>().unwrap(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        UserStore::create(&store, new_user("a@x.com")).await.unwrap();
        let err = UserStore::create(&store, new_user("A@X.com")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_update_rejects_taken_email() {
        let store = MemoryStore::new();
        UserStore::create(&store, new_user("a@x.com")).await.unwrap();
        let b = UserStore::create(&store, new_user("b@x.com")).await.unwrap();

        let update = UserUpdate {
            email: Some(Email::parse("a@x.com").unwrap()),
            ..UserUpdate::default()
        };
        let err = UserStore::update(&store, b.id, update).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_soft_deleted_products_are_hidden() {
        let store = MemoryStore::new();
        let product = ProductStore::create(
            &store,
            NewProduct {
                name: "Mug".to_string(),
                price: "10".parse().unwrap(),
                category: None,
                image: None,
            },
        )
        .await
        .unwrap();

        ProductStore::soft_delete(&store, product.id).await.unwrap();

        assert!(ProductStore::list_active(&store).await.unwrap().is_empty());
        assert!(ProductStore::get_active(&store, product.id).await.unwrap().is_none());
        assert_eq!(ProductStore::count_active(&store).await.unwrap(), 0);
        // Still resolvable for old orders
        let summaries = store.summaries(&[product.id]).await.unwrap();
        assert_eq!(summaries[&product.id].name, "Mug");
        // Second delete finds nothing live
        assert!(matches!(
            ProductStore::soft_delete(&store, product.id).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_featured_is_newest_first_and_limited() {
        let store = MemoryStore::new();
        for i in 1..=6 {
            ProductStore::create(
                &store,
                NewProduct {
                    name: format!("P{i}"),
                    price: "1".parse().unwrap(),
                    category: None,
                    image: None,
                },
            )
            .await
            .unwrap();
        }

        let featured = store.list_featured(4).await.unwrap();
        let names: Vec<_> = featured.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["P6", "P5", "P4", "P3"]);
    }

    #[tokio::test]
    async fn test_cancel_transitions_once() {
        let store = MemoryStore::new();
        let order = OrderStore::create(&store, new_order(UserId::new(1), "20"))
            .await
            .unwrap();

        let cancelled = store.cancel(order.id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        let again = store.cancel(order.id).await.unwrap();
        assert_eq!(again.status, OrderStatus::Cancelled);
        assert_eq!(again.updated_at, cancelled.updated_at);

        assert!(matches!(
            store.cancel(OrderId::new(99)).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_completed_orders_stay_completed() {
        let store = MemoryStore::new();
        let order = OrderStore::create(&store, new_order(UserId::new(1), "5"))
            .await
            .unwrap();
        assert!(store.set_order_status(order.id, OrderStatus::Completed).await);

        let after = store.cancel(order.id).await.unwrap();
        assert_eq!(after.status, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn test_revenue_excludes_cancelled() {
        let store = MemoryStore::new();
        let a = OrderStore::create(&store, new_order(UserId::new(1), "20"))
            .await
            .unwrap();
        OrderStore::create(&store, new_order(UserId::new(2), "5.50"))
            .await
            .unwrap();
        assert_eq!(store.revenue().await.unwrap(), Decimal::new(2550, 2));

        store.cancel(a.id).await.unwrap();
        assert_eq!(store.revenue().await.unwrap(), Decimal::new(550, 2));
        assert_eq!(OrderStore::count(&store).await.unwrap(), 2);
    }
}
