//! Order domain types.
//!
//! Line items are value snapshots taken when the order is placed. Views that
//! need current product data ([`OrderDetails`]) attach it next to the
//! snapshot and never overwrite it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopfront_core::{OrderId, OrderStatus, Price, ProductId, UserId};

use super::catalog::ProductSummary;

const fn default_quantity() -> u32 {
    1
}

/// One product entry in an order, as sent by the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// The product this line refers to.
    pub product: ProductId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// A stored order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// Owning user.
    #[serde(rename = "user")]
    pub user_id: UserId,
    pub products: Vec<LineItem>,
    /// Client-supplied total, stored verbatim.
    pub total: Price,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub products: Vec<LineItem>,
    pub total: Price,
}

/// Owning user of an order, as shown in order listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRef {
    pub id: UserId,
    /// `None` if the account no longer exists.
    pub name: Option<String>,
}

/// A line item snapshot with the product's current details beside it.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedLineItem {
    #[serde(flatten)]
    pub item: LineItem,
    /// `None` if the referenced product does not exist.
    pub current: Option<ProductSummary>,
}

/// An order with its owner and products resolved for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    pub id: OrderId,
    pub user: UserRef,
    pub products: Vec<ResolvedLineItem>,
    pub total: Price,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_line_item_defaults() {
        let item: LineItem = serde_json::from_str(r#"{"product": 3}"#).unwrap();
        assert_eq!(item.product, ProductId::new(3));
        assert_eq!(item.quantity, 1);
        assert!(item.name.is_none());
        assert!(item.price.is_none());
    }

    #[test]
    fn test_line_item_accepts_cart_payload() {
        let item: LineItem = serde_json::from_str(
            r#"{"product": 1, "name": "Mug", "price": 10, "quantity": 2,
                "image": "/uploads/mug.png", "category": "Kitchen"}"#,
        )
        .unwrap();
        assert_eq!(item.quantity, 2);
        assert_eq!(item.price.unwrap().to_string(), "10");
        assert_eq!(item.category.as_deref(), Some("Kitchen"));
    }

    #[test]
    fn test_order_serializes_owner_as_user() {
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(1),
            user_id: UserId::new(7),
            products: vec![],
            total: "20".parse().unwrap(),
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["user"], 7);
        assert_eq!(json["status"], "pending");
        assert_eq!(json["total"].as_f64(), Some(20.0));
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_resolved_line_item_flattens_snapshot() {
        let resolved = ResolvedLineItem {
            item: LineItem {
                product: ProductId::new(4),
                name: Some("Old name".to_string()),
                price: None,
                quantity: 1,
                image: None,
                category: None,
            },
            current: None,
        };
        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(json["product"], 4);
        assert_eq!(json["name"], "Old name");
        assert!(json["current"].is_null());
    }
}
