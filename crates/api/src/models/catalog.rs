//! Catalog domain types: categories and products.
//!
//! A product's `category` is free text, not a reference to a [`Category`].
//! Renaming or deleting a category never touches products.

use chrono::{DateTime, Utc};
use serde::Serialize;

use shopfront_core::{CategoryId, Price, ProductId};

/// A product category shown on the storefront.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    /// Public path of the category image (e.g. `/uploads/...`).
    pub image: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// Partial category update. `None` keeps the stored value, so an update
/// without an upload never clears the image.
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// A product for sale.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    /// Free-text category name.
    pub category: Option<String>,
    /// Public path of the product image.
    pub image: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// The display fields attached to order line items.
    #[must_use]
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id,
            name: self.name.clone(),
            price: self.price,
            category: self.category.clone(),
            image: self.image.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: Price,
    pub category: Option<String>,
    pub image: Option<String>,
}

/// Partial product update. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub price: Option<Price>,
    pub category: Option<String>,
    pub image: Option<String>,
}

/// Current display details of a product, resolved alongside order line
/// items. Resolved regardless of the product's soft-delete flag so old
/// orders still render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub category: Option<String>,
    pub image: Option<String>,
}
