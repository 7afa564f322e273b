//! Category and product management.
//!
//! Lists never include soft-deleted records. Create and update accept an
//! optional uploaded image; an update without one keeps the stored image.

use serde::Deserialize;
use tracing::instrument;

use shopfront_core::{CategoryId, Price, ProductId};

use crate::db::{CategoryStore, ProductStore};
use crate::error::{AppError, Result, or_not_found};
use crate::models::{
    Category, CategoryUpdate, NewCategory, NewProduct, Product, ProductUpdate,
};
use crate::services::uploads::{ImageStore, UploadedImage};

/// How many products the storefront features.
pub const FEATURED_PRODUCTS: i64 = 4;

/// Category fields from a JSON body or multipart form.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CategoryForm {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Existing image URL, used when no file is uploaded.
    pub image: Option<String>,
}

/// Product fields from a JSON body or multipart form.
///
/// `price` accepts a number or a numeric string, since multipart fields are
/// always text.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProductForm {
    pub name: Option<String>,
    pub price: Option<Price>,
    pub category: Option<String>,
    pub image: Option<String>,
}

/// Trim a text field, treating blank as absent.
fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn require_name(name: Option<String>) -> Result<String> {
    clean(name).ok_or_else(|| AppError::Validation("Name is required".to_string()))
}

/// Category and product operations.
pub struct CatalogService<'a> {
    categories: &'a dyn CategoryStore,
    products: &'a dyn ProductStore,
    images: &'a ImageStore,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(
        categories: &'a dyn CategoryStore,
        products: &'a dyn ProductStore,
        images: &'a ImageStore,
    ) -> Self {
        Self {
            categories,
            products,
            images,
        }
    }

    /// Stored image path: the upload if present, else the form's URL.
    async fn image_path(
        &self,
        upload: Option<&UploadedImage>,
        from_form: Option<String>,
    ) -> Result<Option<String>> {
        match upload {
            Some(image) => Ok(Some(self.images.save(image).await?)),
            None => Ok(clean(from_form)),
        }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Non-deleted categories.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    pub async fn categories(&self) -> Result<Vec<Category>> {
        Ok(self.categories.list_active().await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::Validation` without a name, or `AppError::Upload`
    /// for a rejected image.
    #[instrument(skip_all)]
    pub async fn create_category(
        &self,
        form: CategoryForm,
        upload: Option<UploadedImage>,
    ) -> Result<Category> {
        let name = require_name(form.name)?;
        let image = self.image_path(upload.as_ref(), form.image).await?;

        let category = self
            .categories
            .create(NewCategory {
                name,
                description: clean(form.description),
                image,
            })
            .await?;

        tracing::info!(category_id = %category.id, "Category created");
        Ok(category)
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown or deleted id.
    #[instrument(skip(self, form, upload))]
    pub async fn update_category(
        &self,
        id: CategoryId,
        form: CategoryForm,
        upload: Option<UploadedImage>,
    ) -> Result<Category> {
        if form.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::Validation("Name cannot be empty".to_string()));
        }

        // Resolve the id before writing any upload
        if self.categories.get_active(id).await?.is_none() {
            return Err(AppError::NotFound("Category not found".to_string()));
        }

        let image = self.image_path(upload.as_ref(), form.image).await?;
        let update = CategoryUpdate {
            name: clean(form.name),
            description: clean(form.description),
            image,
        };

        self.categories
            .update(id, update)
            .await
            .map_err(or_not_found("Category"))
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown or already deleted id.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: CategoryId) -> Result<Category> {
        let category = self
            .categories
            .soft_delete(id)
            .await
            .map_err(or_not_found("Category"))?;
        tracing::info!(category_id = %id, "Category deleted");
        Ok(category)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Non-deleted products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    pub async fn products(&self) -> Result<Vec<Product>> {
        Ok(self.products.list_active().await?)
    }

    /// The newest non-deleted products.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    pub async fn featured_products(&self) -> Result<Vec<Product>> {
        Ok(self.products.list_featured(FEATURED_PRODUCTS).await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown or deleted id.
    pub async fn product(&self, id: ProductId) -> Result<Product> {
        self.products
            .get_active(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
    }

    /// # Errors
    ///
    /// Returns `AppError::Validation` without a name or price, or
    /// `AppError::Upload` for a rejected image.
    #[instrument(skip_all)]
    pub async fn create_product(
        &self,
        form: ProductForm,
        upload: Option<UploadedImage>,
    ) -> Result<Product> {
        let name = require_name(form.name)?;
        let price = form
            .price
            .ok_or_else(|| AppError::Validation("Price is required".to_string()))?;
        let image = self.image_path(upload.as_ref(), form.image).await?;

        let product = self
            .products
            .create(NewProduct {
                name,
                price,
                category: clean(form.category),
                image,
            })
            .await?;

        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown or deleted id.
    #[instrument(skip(self, form, upload))]
    pub async fn update_product(
        &self,
        id: ProductId,
        form: ProductForm,
        upload: Option<UploadedImage>,
    ) -> Result<Product> {
        if form.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::Validation("Name cannot be empty".to_string()));
        }

        if self.products.get_active(id).await?.is_none() {
            return Err(AppError::NotFound("Product not found".to_string()));
        }

        let image = self.image_path(upload.as_ref(), form.image).await?;
        let update = ProductUpdate {
            name: clean(form.name),
            price: form.price,
            category: clean(form.category),
            image,
        };

        self.products
            .update(id, update)
            .await
            .map_err(or_not_found("Product"))
    }

    /// Soft-delete a product.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown or already deleted id.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<Product> {
        let product = self
            .products
            .soft_delete(id)
            .await
            .map_err(or_not_found("Product"))?;
        tracing::info!(product_id = %id, "Product deleted");
        Ok(product)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Bytes;

    use super::*;
    use crate::db::MemoryStore;

    fn images() -> ImageStore {
        ImageStore::new(std::env::temp_dir().join("shopfront-catalog-tests"))
    }

    fn product_form(name: &str, price: &str) -> ProductForm {
        ProductForm {
            name: Some(name.to_string()),
            price: Some(price.parse().unwrap()),
            ..ProductForm::default()
        }
    }

    #[test]
    fn test_product_form_accepts_string_price() {
        let form: ProductForm =
            serde_json::from_value(serde_json::json!({"name": "Mug", "price": "12.50"})).unwrap();
        assert_eq!(form.price.unwrap().to_string(), "12.50");
        assert!(
            serde_json::from_value::<ProductForm>(serde_json::json!({"price": "-3"})).is_err()
        );
    }

    #[tokio::test]
    async fn test_create_product_requires_name_and_price() {
        let store = MemoryStore::new();
        let images = images();
        let catalog = CatalogService::new(&store, &store, &images);

        let err = catalog
            .create_product(
                ProductForm {
                    price: Some("1".parse().unwrap()),
                    ..ProductForm::default()
                },
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = catalog
            .create_product(
                ProductForm {
                    name: Some("Mug".to_string()),
                    ..ProductForm::default()
                },
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_keeps_image_without_upload() {
        let store = MemoryStore::new();
        let images = images();
        let catalog = CatalogService::new(&store, &store, &images);

        let mut form = product_form("Mug", "10");
        form.image = Some("/uploads/mug.png".to_string());
        let product = catalog.create_product(form, None).await.unwrap();

        let updated = catalog
            .update_product(product.id, product_form("Big Mug", "12"), None)
            .await
            .unwrap();
        assert_eq!(updated.name, "Big Mug");
        assert_eq!(updated.image.as_deref(), Some("/uploads/mug.png"));
    }

    #[tokio::test]
    async fn test_deleted_product_is_not_found() {
        let store = MemoryStore::new();
        let images = images();
        let catalog = CatalogService::new(&store, &store, &images);

        let product = catalog
            .create_product(product_form("Mug", "10"), None)
            .await
            .unwrap();
        catalog.delete_product(product.id).await.unwrap();

        assert!(matches!(
            catalog.product(product.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(catalog.products().await.unwrap().is_empty());
        assert!(matches!(
            catalog
                .update_product(product.id, product_form("Mug", "10"), None)
                .await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_category_lifecycle() {
        let store = MemoryStore::new();
        let images = images();
        let catalog = CatalogService::new(&store, &store, &images);

        let category = catalog
            .create_category(
                CategoryForm {
                    name: Some(" Kitchen ".to_string()),
                    description: Some("Pots".to_string()),
                    image: None,
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(category.name, "Kitchen");

        let updated = catalog
            .update_category(
                category.id,
                CategoryForm {
                    description: Some("Pots and pans".to_string()),
                    ..CategoryForm::default()
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Kitchen");
        assert_eq!(updated.description.as_deref(), Some("Pots and pans"));

        catalog.delete_category(category.id).await.unwrap();
        assert!(catalog.categories().await.unwrap().is_empty());
        assert!(matches!(
            catalog.delete_category(category.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_non_image_upload() {
        let store = MemoryStore::new();
        let images = images();
        let catalog = CatalogService::new(&store, &store, &images);

        let upload = UploadedImage {
            file_name: Some("notes.txt".to_string()),
            content_type: Some("text/plain".to_string()),
            bytes: Bytes::from_static(b"hello"),
        };
        let err = catalog
            .create_category(
                CategoryForm {
                    name: Some("Books".to_string()),
                    ..CategoryForm::default()
                },
                Some(upload),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upload(_)));
        assert!(catalog.categories().await.unwrap().is_empty());
    }
}
