//! Seed the catalog from a YAML file.
//!
//! Categories are created first, then their products with the category
//! name attached. Records whose names already exist among active
//! categories or products are skipped, so the command can be re-run.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use shopfront_api::db::{self, CategoryStore, PgCategoryRepository, PgProductRepository, ProductStore};
use shopfront_api::models::{NewCategory, NewProduct};
use shopfront_core::Price;

/// Top level of the seed file.
#[derive(Debug, Deserialize)]
pub struct CatalogSeed {
    pub categories: Vec<CategorySeed>,
}

#[derive(Debug, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

#[derive(Debug, Deserialize)]
pub struct ProductSeed {
    pub name: String,
    pub price: Price,
    pub image: Option<String>,
}

/// Check a parsed seed file, returning one message per problem.
pub fn validate_seed(seed: &CatalogSeed) -> Vec<String> {
    let mut errors = Vec::new();
    let mut categories = HashSet::new();
    let mut products = HashSet::new();

    for category in &seed.categories {
        if category.name.trim().is_empty() {
            errors.push("category with empty name".to_string());
        } else if !categories.insert(category.name.trim()) {
            errors.push(format!("duplicate category: {}", category.name));
        }

        for product in &category.products {
            if product.name.trim().is_empty() {
                errors.push(format!("product with empty name in {}", category.name));
            } else if !products.insert(product.name.trim()) {
                errors.push(format!("duplicate product: {}", product.name));
            }
        }
    }

    errors
}

/// Seed categories and products from `file_path`.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the file cannot be
/// read or fails validation, or a database operation fails.
pub async fn catalog(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let database_url = super::database_url().ok_or("SHOPFRONT_DATABASE_URL not set")?;

    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog seed");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let seed: CatalogSeed = serde_yaml::from_str(&content)?;

    let errors = validate_seed(&seed);
    if !errors.is_empty() {
        error!("Seed validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let categories = PgCategoryRepository::new(pool.clone());
    let products = PgProductRepository::new(pool);

    let existing_categories: HashSet<String> = categories
        .list_active()
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();
    let existing_products: HashSet<String> = products
        .list_active()
        .await?
        .into_iter()
        .map(|p| p.name)
        .collect();

    let (mut created_categories, mut created_products, mut skipped) = (0_usize, 0_usize, 0_usize);

    for category in seed.categories {
        let name = category.name.trim().to_owned();
        if existing_categories.contains(&name) {
            skipped += 1;
        } else {
            categories
                .create(NewCategory {
                    name: name.clone(),
                    description: category.description,
                    image: category.image,
                })
                .await?;
            created_categories += 1;
        }

        for product in category.products {
            let product_name = product.name.trim().to_owned();
            if existing_products.contains(&product_name) {
                skipped += 1;
                continue;
            }
            products
                .create(NewProduct {
                    name: product_name,
                    price: product.price,
                    category: Some(name.clone()),
                    image: product.image,
                })
                .await?;
            created_products += 1;
        }
    }

    info!(
        categories = created_categories,
        products = created_products,
        skipped,
        "Catalog seeding complete"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_seed_is_valid() {
        let seed: CatalogSeed = serde_yaml::from_str(include_str!("../../seeds/catalog.yaml")).unwrap();
        assert_eq!(seed.categories.len(), 3);
        assert!(validate_seed(&seed).is_empty());
        assert_eq!(seed.categories[0].products[0].price.to_string(), "12.50");
    }

    #[test]
    fn test_duplicates_are_reported() {
        let seed: CatalogSeed = serde_yaml::from_str(
            r#"
categories:
  - name: Tea
    products:
      - { name: Sencha, price: "5" }
  - name: Tea
    products:
      - { name: Sencha, price: "6" }
"#,
        )
        .unwrap();
        let errors = validate_seed(&seed);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_non_positive_price_is_rejected() {
        let result = serde_yaml::from_str::<CatalogSeed>(
            r#"
categories:
  - name: Tea
    products:
      - { name: Free, price: "0" }
"#,
        );
        assert!(result.is_err());
    }
}
