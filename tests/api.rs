//! HTTP-level tests driving the full router over the in-memory store.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot`
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use techmarket_api::api::{self, AppState};
use techmarket_api::storage::Store;

fn create_test_app() -> axum::Router {
    api::router(AppState::new(Store::memory()), CorsLayer::permissive())
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap_or(json!({}));
    (status, body)
}

async fn create_product(app: &axum::Router, name: &str, price: f64) -> String {
    let (status, body) = send(app, "POST", "/api/products", Some(json!({ "name": name, "price": price }))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}

async fn create_review(app: &axum::Router, product_id: &str, rating: i64) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/reviews",
        Some(json!({
            "productId": product_id,
            "userId": Uuid::new_v4(),
            "rating": rating,
            "title": format!("{rating} stars"),
            "content": "Detailed thoughts after two weeks of use",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

async fn add_to_cart(app: &axum::Router, user: Uuid, product_id: &str, quantity: i64) -> (StatusCode, Value) {
    send(app, "POST", "/api/cart", Some(json!({ "userId": user, "productId": product_id, "quantity": quantity }))).await
}

// =============================================================================
// Service endpoints
// =============================================================================

#[tokio::test]
async fn test_health_and_fallback() {
    let app = create_test_app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, "GET", "/api/nowhere", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Not Found - /api/nowhere");
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
async fn test_add_merges_quantities() {
    let app = create_test_app();
    let product = create_product(&app, "Mechanical Keyboard", 89.5).await;
    let user = Uuid::new_v4();

    let (status, body) = add_to_cart(&app, user, &product, 2).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Cart created and product added successfully");

    let (_, body) = add_to_cart(&app, user, &product, 3).await;
    assert_eq!(body["message"], "Product quantity updated successfully");
    assert_eq!(body["cart"]["productIds"].as_array().unwrap().len(), 1);
    assert_eq!(body["cart"]["quantities"][&product], 5);

    let (status, body) = send(&app, "GET", &format!("/api/cart/user/{user}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 5);
    assert_eq!(items[0]["product"]["name"], "Mechanical Keyboard");
}

#[tokio::test]
async fn test_add_rejects_bad_input() {
    let app = create_test_app();
    let product = create_product(&app, "Mouse", 25.0).await;
    let user = Uuid::new_v4();

    let (status, body) = add_to_cart(&app, user, &product, 0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Quantity must be at least 1");

    let (status, _) = send(&app, "POST", "/api/cart", Some(json!({ "userId": user, "quantity": 1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = add_to_cart(&app, user, &Uuid::new_v4().to_string(), 1).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product not found");

    let (status, _) = send(&app, "GET", &format!("/api/cart/user/{user}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_oversized_quantities_are_rejected() {
    let app = create_test_app();
    let product = create_product(&app, "USB Hub", 34.0).await;
    let user = Uuid::new_v4();

    let (status, body) = add_to_cart(&app, user, &product, 5_000_000_000).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Quantity is too large");

    let (status, body) = add_to_cart(&app, user, &product, i64::from(u32::MAX)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let cart_id = body["cart"]["id"].as_str().unwrap().to_string();

    let (status, body) = add_to_cart(&app, user, &product, 1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Quantity is too large");

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/cart/{cart_id}/product/{product}"),
        Some(json!({ "quantity": 5_000_000_000i64 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Quantity is too large");

    let (_, body) = send(&app, "GET", &format!("/api/cart/user/{user}"), None).await;
    assert_eq!(body["items"][0]["quantity"], u64::from(u32::MAX));
}

#[tokio::test]
async fn test_set_quantity_zero_leaves_cart_unchanged() {
    let app = create_test_app();
    let product = create_product(&app, "Webcam", 59.99).await;
    let user = Uuid::new_v4();
    let (_, body) = add_to_cart(&app, user, &product, 2).await;
    let cart_id = body["cart"]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/cart/{cart_id}/product/{product}");
    let (status, _) = send(&app, "PATCH", &uri, Some(json!({ "quantity": 0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, "GET", &format!("/api/cart/user/{user}"), None).await;
    assert_eq!(body["items"][0]["quantity"], 2);

    let (status, body) = send(&app, "PATCH", &uri, Some(json!({ "quantity": 7 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Cart item updated successfully");
    assert_eq!(body["cart"]["quantities"][&product], 7);
}

#[tokio::test]
async fn test_remove_missing_product_is_not_found() {
    let app = create_test_app();
    let kept = create_product(&app, "Monitor", 199.0).await;
    let other = create_product(&app, "Speaker", 49.0).await;
    let user = Uuid::new_v4();
    let (_, body) = add_to_cart(&app, user, &kept, 1).await;
    let cart_id = body["cart"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "DELETE", &format!("/api/cart/{cart_id}/product/{other}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product not found in the cart");

    let (status, body) = send(&app, "DELETE", &format!("/api/cart/{cart_id}/product/{kept}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Product removed from cart successfully");
    assert!(body["cart"]["productIds"].as_array().unwrap().is_empty());
    assert_eq!(body["cart"]["quantities"], json!({}));

    let (status, body) = send(&app, "GET", &format!("/api/cart/user/{user}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Cart is empty for this user");

    let (status, body) = send(&app, "GET", &format!("/api/cart/user/full/{user}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["products"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_cart_and_delete_idempotence() {
    let app = create_test_app();
    let product = create_product(&app, "Router", 120.0).await;
    let missing = Uuid::new_v4();

    let (status, body) = send(&app, "PATCH", &format!("/api/cart/{missing}/product/{product}"), Some(json!({ "quantity": 1 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Cart not found");

    let (status, body) = send(&app, "DELETE", &format!("/api/cart/{missing}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Cart deleted successfully");

    let (status, _) = send(&app, "GET", "/api/cart/user/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_full_cart_embeds_reviews() {
    let app = create_test_app();
    let product = create_product(&app, "Tablet", 329.0).await;
    create_review(&app, &product, 5).await;
    let user = Uuid::new_v4();
    add_to_cart(&app, user, &product, 1).await;

    let (status, body) = send(&app, "GET", &format!("/api/cart/user/full/{user}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], user.to_string());
    assert_eq!(body["products"][0]["name"], "Tablet");
    assert_eq!(body["products"][0]["reviews"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, "GET", &format!("/api/cart/user/full/{}", Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Cart not found for this user");
}

// =============================================================================
// Reviews
// =============================================================================

#[tokio::test]
async fn test_summary_follows_review_changes() {
    let app = create_test_app();
    let product = create_product(&app, "Headphones", 149.0).await;
    let mut ids = Vec::new();
    for rating in [5, 4, 4, 3] {
        let body = create_review(&app, &product, rating).await;
        assert_eq!(body["review"]["helpfulVotes"], 0);
        ids.push(body["reviewId"].as_str().unwrap().to_string());
    }

    let (_, body) = send(&app, "GET", &format!("/api/products/{product}"), None).await;
    assert_eq!(body["totalReviews"], 4);
    assert_eq!(body["averageRating"], 4.0);
    assert_eq!(body["ratingDistribution"], json!({ "1": 0, "2": 0, "3": 1, "4": 2, "5": 1 }));

    let (status, _) = send(&app, "PATCH", &format!("/api/reviews/{}", ids[3]), Some(json!({ "rating": 1 }))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "DELETE", &format!("/api/reviews/{}", ids[0]), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, product_body) = send(&app, "GET", &format!("/api/products/{product}"), None).await;
    let (status, stats) = send(&app, "GET", &format!("/api/reviews/product/{product}/stats"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(stats.get("statistics").is_none());
    assert_eq!(product_body["totalReviews"], stats["totalReviews"]);
    assert_eq!(product_body["averageRating"], stats["averageRating"]);
    assert_eq!(product_body["ratingDistribution"], stats["ratingDistribution"]);
    assert_eq!(product_body["averageRating"], 3.0);
}

#[tokio::test]
async fn test_review_validation_and_not_found() {
    let app = create_test_app();
    let product = create_product(&app, "Charger", 19.99).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/reviews",
        Some(json!({ "productId": product, "userId": Uuid::new_v4(), "rating": 6, "title": "Too good", "content": "Charges everything quickly" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Rating must be between 1 and 5");

    let review = create_review(&app, &product, 4).await;
    let id = review["reviewId"].as_str().unwrap();
    let (status, body) = send(&app, "PUT", &format!("/api/reviews/{id}"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No changes were made to the review");

    let missing = Uuid::new_v4();
    let (status, _) = send(&app, "GET", &format!("/api/reviews/{missing}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "DELETE", &format!("/api/reviews/{missing}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "PATCH", &format!("/api/reviews/{missing}/helpful"), Some(json!({ "increment": true }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_helpful_votes_floor() {
    let app = create_test_app();
    let product = create_product(&app, "Cable", 9.99).await;
    let review = create_review(&app, &product, 3).await;
    let uri = format!("/api/reviews/{}/helpful", review["reviewId"].as_str().unwrap());

    let (status, body) = send(&app, "PATCH", &uri, Some(json!({ "increment": false }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Helpful votes cannot go below 0");

    let (status, body) = send(&app, "PATCH", &uri, Some(json!({ "increment": true }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Review upvoted successfully");
    assert_eq!(body["helpfulVotes"], 1);

    let (_, body) = send(&app, "PATCH", &uri, Some(json!({ "increment": false }))).await;
    assert_eq!(body["message"], "Review downvoted successfully");
    assert_eq!(body["helpfulVotes"], 0);
}

#[tokio::test]
async fn test_search_min_rating() {
    let app = create_test_app();
    let product = create_product(&app, "Smartwatch", 249.0).await;
    for rating in [2, 3, 4, 5] {
        create_review(&app, &product, rating).await;
    }

    let (status, body) = send(&app, "GET", "/api/reviews/search?minRating=4&sortBy=rating&sortOrder=asc", None).await;
    assert_eq!(status, StatusCode::OK);
    let ratings: Vec<i64> = body["reviews"].as_array().unwrap().iter().map(|r| r["rating"].as_i64().unwrap()).collect();
    assert_eq!(ratings, vec![4, 5]);
    assert_eq!(body["pagination"]["total"], 2);
    assert_eq!(body["filters"]["minRating"], 4);
    assert_eq!(body["filters"]["sortBy"], "rating");

    let (status, _) = send(&app, "GET", "/api/reviews/search?minRating=9", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, "GET", "/api/reviews/search?productId=not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, "GET", "/api/reviews/search?sortBy=popularity", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_scoped_to_product() {
    let app = create_test_app();
    let tablet = create_product(&app, "Tablet", 399.0).await;
    let phone = create_product(&app, "Phone", 699.0).await;
    for product in [&tablet, &phone] {
        for rating in [2, 5] {
            create_review(&app, product, rating).await;
        }
    }

    let (status, body) = send(&app, "GET", &format!("/api/reviews/search?productId={tablet}&minRating=4"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 1);
    let reviews = body["reviews"].as_array().unwrap();
    assert_eq!(reviews[0]["productId"], tablet.as_str());
    assert_eq!(reviews[0]["rating"], 5);
    assert_eq!(body["filters"]["productId"], tablet.as_str());
    assert_eq!(body["filters"]["minRating"], 4);

    let (_, body) = send(&app, "GET", "/api/reviews/search?minRating=4", None).await;
    assert_eq!(body["pagination"]["total"], 2);
    assert!(body["filters"]["productId"].is_null());
}

#[tokio::test]
async fn test_product_reviews_paginate() {
    let app = create_test_app();
    let product = create_product(&app, "Drone", 799.0).await;
    for rating in [1, 2, 3, 4, 5] {
        create_review(&app, &product, rating).await;
    }

    let (status, body) = send(&app, "GET", &format!("/api/reviews/product/{product}?limit=2&page=3"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reviews"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"]["totalPages"], 3);
    assert_eq!(body["pagination"]["hasNext"], false);
    assert_eq!(body["pagination"]["hasPrev"], true);
}

// =============================================================================
// Catalog and users
// =============================================================================

#[tokio::test]
async fn test_product_delete_cascades() {
    let app = create_test_app();
    let product = create_product(&app, "Console", 499.0).await;
    let review = create_review(&app, &product, 5).await;

    let (status, body) = send(&app, "DELETE", &format!("/api/products/{product}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Product and its reviews deleted successfully");

    let (status, _) = send(&app, "GET", &format!("/api/reviews/{}", review["reviewId"].as_str().unwrap()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_category_products_and_attribute_search() {
    let app = create_test_app();
    let (status, category) = send(&app, "POST", "/api/categories", Some(json!({ "name": "Laptops" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let category_id = category["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        "POST",
        "/api/products",
        Some(json!({ "name": "Ultrabook", "price": 1299.99, "categoryId": category_id, "attributes": { "ram": "16GB" } })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, "POST", "/api/products", Some(json!({ "name": "Bad", "price": 1.999 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (_, body) = send(&app, "GET", &format!("/api/categories/products/{category_id}"), None).await;
    assert_eq!(body["name"], "Laptops");
    assert_eq!(body["products"][0]["name"], "Ultrabook");

    let (_, body) = send(&app, "GET", "/api/products/search/attribute?name=ram&value=16GB", None).await;
    assert_eq!(body["products"].as_array().unwrap().len(), 1);
    assert_eq!(body["products"][0]["totalReviews"], 0);
}

#[tokio::test]
async fn test_user_conflicts() {
    let app = create_test_app();
    let user = json!({ "username": "lin_dev", "email": "lin@example.com" });
    let (status, _) = send(&app, "POST", "/api/users", Some(user.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, "POST", "/api/users", Some(json!({ "username": "lin2", "email": "LIN@example.com" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Email already in use");

    let (status, body) = send(&app, "POST", "/api/users", Some(json!({ "username": "lin_dev", "email": "other@example.com" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Username already taken");

    let (status, _) = send(&app, "POST", "/api/users", Some(json!({ "username": "no spaces", "email": "x@example.com" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
