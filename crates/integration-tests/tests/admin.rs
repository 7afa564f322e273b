//! Integration tests for the admin API.

#![allow(clippy::unwrap_used)]

use reqwest::{
    StatusCode,
    multipart::{Form, Part},
};
use serde_json::{Value, json};

use shopfront_integration_tests::{TestApp, message_of, test_signer};

/// Smallest valid PNG header, enough for a content-type check.
const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

#[tokio::test]
async fn test_admin_routes_require_admin_role() {
    let app = TestApp::spawn().await;
    let shopper = app.shopper("a@example.com").await;

    let response = app.get("/api/admin/dashboard/stats", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.get("/api/admin/dashboard/stats", Some(&shopper)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(message_of(response).await, "Admin resource. Access denied.");

    let admin = app.admin().await;
    let response = app.get("/api/admin/dashboard", Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_product_lifecycle_with_soft_delete() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let product = app.create_product(&admin, "Kettle", 49.95).await;
    let path = format!("/api/admin/products/{}", product["id"]);

    assert_eq!(product["price"].as_f64(), Some(49.95));
    assert_eq!(product["isDeleted"], false);

    let response = app.put(&path, Some(&admin), &json!({ "price": 45 })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["name"], "Kettle");
    assert_eq!(updated["price"].as_f64(), Some(45.0));

    let response = app.get(&path, Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.delete(&path, Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let deleted: Value = response.json().await.unwrap();
    assert_eq!(deleted["isDeleted"], true);

    let response = app.get(&path, Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    for list in ["/api/users/products", "/api/users/feature-products"] {
        let products: Vec<Value> = app.get(list, None).await.json().await.unwrap();
        assert!(products.is_empty(), "{list}");
    }
    let products: Vec<Value> = app
        .get("/api/admin/products", Some(&admin))
        .await
        .json()
        .await
        .unwrap();
    assert!(products.is_empty());

    let response = app.delete(&path, Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_product_requires_name_and_price() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;

    for body in [
        json!({ "name": "No price" }),
        json!({ "price": 5 }),
        json!({ "name": "Free", "price": 0 }),
    ] {
        let response = app.post("/api/admin/products", Some(&admin), &body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
    }
}

#[tokio::test]
async fn test_featured_products_are_newest_four() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    for i in 1..=5 {
        app.create_product(&admin, &format!("Product {i}"), 10.0).await;
    }

    let featured: Vec<Value> = app
        .get("/api/users/feature-products", None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(featured.len(), 4);
    assert_eq!(featured[0]["name"], "Product 5");

    let all: Vec<Value> = app.get("/api/users/products", None).await.json().await.unwrap();
    assert_eq!(all.len(), 5);
}

#[tokio::test]
async fn test_category_with_image_upload() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;

    let form = Form::new()
        .text("name", "Coffee")
        .text("description", "Beans")
        .part(
            "image",
            Part::bytes(PNG_BYTES.to_vec())
                .file_name("beans.png")
                .mime_str("image/png")
                .unwrap(),
        );
    let response = app
        .client
        .post(app.url("/api/admin/categories"))
        .bearer_auth(&admin)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let category: Value = response.json().await.unwrap();
    assert_eq!(category["name"], "Coffee");

    let image = category["image"].as_str().unwrap();
    assert!(image.starts_with("/uploads/"));
    assert!(image.ends_with(".png"));

    let response = app.get(image, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.bytes().await.unwrap().as_ref(), PNG_BYTES);

    // JSON update without an image keeps the stored one
    let path = format!("/api/admin/categories/{}", category["id"]);
    let response = app.put(&path, Some(&admin), &json!({ "name": "Coffees" })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["name"], "Coffees");
    assert_eq!(updated["image"], image);

    let categories: Vec<Value> = app
        .get("/api/users/categoriesForUser", None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(categories.len(), 1);

    let response = app.delete(&path, Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Category deleted" }));

    let categories: Vec<Value> = app
        .get("/api/users/categoriesForUser", None)
        .await
        .json()
        .await
        .unwrap();
    assert!(categories.is_empty());
}

#[tokio::test]
async fn test_non_image_upload_is_rejected() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;

    let form = Form::new()
        .text("name", "Notes")
        .text("price", "3.50")
        .part(
            "image",
            Part::bytes(b"plain text".to_vec())
                .file_name("notes.txt")
                .mime_str("text/plain")
                .unwrap(),
        );
    let response = app
        .client
        .post(app.url("/api/admin/products"))
        .bearer_auth(&admin)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let products: Vec<Value> = app.get("/api/users/products", None).await.json().await.unwrap();
    assert!(products.is_empty());
}

#[tokio::test]
async fn test_multipart_product_without_file() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;

    let form = Form::new()
        .text("name", "Filters")
        .text("price", "6.50")
        .text("category", "Brewing");
    let response = app
        .client
        .post(app.url("/api/admin/products"))
        .bearer_auth(&admin)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let product: Value = response.json().await.unwrap();
    assert_eq!(product["price"].as_f64(), Some(6.5));
    assert_eq!(product["category"], "Brewing");
    assert!(product["image"].is_null());
}

#[tokio::test]
async fn test_revenue_excludes_cancelled_orders() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let shopper = app.shopper("a@example.com").await;
    let product = app.create_product(&admin, "Beans", 20.0).await;

    let first = app.place_order(&shopper, &product["id"], 20.0).await;
    app.place_order(&shopper, &product["id"], 30.0).await;

    let stats: Value = app
        .get("/api/admin/dashboard/stats", Some(&admin))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(stats["users"], 2);
    assert_eq!(stats["orders"], 2);
    assert_eq!(stats["products"], 1);
    assert_eq!(stats["revenue"].as_f64(), Some(50.0));

    let response = app
        .put(
            &format!("/api/admin/orders/{}/cancel", first["id"]),
            Some(&admin),
            &json!({}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let stats: Value = app
        .get("/api/admin/dashboard/stats", Some(&admin))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(stats["orders"], 2);
    assert_eq!(stats["revenue"].as_f64(), Some(30.0));
}

#[tokio::test]
async fn test_order_listings() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let shopper = app.shopper("a@example.com").await;
    for _ in 0..12 {
        app.place_order(&shopper, &json!(1), 5.0).await;
    }

    let recent: Vec<Value> = app
        .get("/api/admin/dashboard/recent-orders", Some(&admin))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(recent.len(), 10);
    assert_eq!(recent[0]["user"]["name"], "Shopper");

    let all: Vec<Value> = app
        .get("/api/admin/orders", Some(&admin))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 12);
    // Product 1 was never created
    assert!(all[0]["products"][0]["current"].is_null());
}

#[tokio::test]
async fn test_user_management() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let first = app.shopper("first@example.com").await;
    app.shopper("second@example.com").await;
    let first_id = test_signer().verify(&first).unwrap().sub;

    let users: Vec<Value> = app
        .get("/api/admin/users", Some(&admin))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u["role"] == "user"));

    let path = format!("/api/admin/users/{first_id}");
    let response = app
        .put(&path, Some(&admin), &json!({ "email": "second@example.com" }))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(message_of(response).await, "Email already in use");

    let response = app.put(&path, Some(&admin), &json!({ "name": "Renamed" })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let user: Value = response.json().await.unwrap();
    assert_eq!(user["name"], "Renamed");
    assert_eq!(user["email"], "first@example.com");

    let response = app.delete(&path, Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "User soft deleted");
    assert_eq!(body["user"]["isDeleted"], true);

    let users: Vec<Value> = app
        .get("/api/admin/users", Some(&admin))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(users.len(), 1);
}
