//! Domain models.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`]. They serialize to the JSON shapes the API returns.

pub mod catalog;
pub mod order;
pub mod user;

pub use catalog::{
    Category, CategoryUpdate, NewCategory, NewProduct, Product, ProductSummary, ProductUpdate,
};
pub use order::{LineItem, NewOrder, Order, OrderDetails, ResolvedLineItem, UserRef};
pub use user::{NewUser, User, UserUpdate};
