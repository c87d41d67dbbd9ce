//! End-to-end tests: HTTP requests through the router against an
//! in-memory database.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;

use checkout_api::rate_limit::RateLimiter;
use checkout_api::services::notification_service::{LogNotifier, NotificationDispatcher};
use checkout_api::{router, AppState, StorefrontsConfig};
use storefront_core::{Money, Product};
use storefront_db::{Database, DbConfig};

const STOREFRONTS: &str = r#"
    [storefronts.stylehunt]
    name = "StyleHunt"

    [storefronts.stylehunt.pricing]
    shape = "percentage"

    [storefronts.bengolsale]
    name = "Bengol Sale"

    [storefronts.bengolsale.pricing]
    shape = "pack"
    pack_size = 6
    pack_price_taka = 1350
    unit_price_taka = 250

    [storefronts.tinyshop]
    name = "Tiny Shop"

    [storefronts.tinyshop.limits]
    ip_max_requests = 2

    [storefronts.phoneshop]
    name = "Phone Shop"

    [storefronts.phoneshop.limits]
    ip_max_requests = 2
    phone_max_requests = 3

    [storefronts.nobrand]
    name = "Not Seeded"
"#;

struct TestApp {
    app: Router,
    db: Database,
}

async fn setup() -> TestApp {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    for (id, name) in [
        ("stylehunt", "StyleHunt"),
        ("bengolsale", "Bengol Sale"),
        ("tinyshop", "Tiny Shop"),
        ("phoneshop", "Phone Shop"),
    ] {
        db.brands().insert(id, name).await.unwrap();
    }
    for (id, storefront, price) in [
        ("shirt", "stylehunt", 1000),
        ("roll", "bengolsale", 250),
        ("mug", "tinyshop", 300),
        ("cover", "phoneshop", 300),
    ] {
        db.products()
            .insert(&Product {
                id: id.into(),
                storefront_id: storefront.into(),
                name: format!("Catalog {id}"),
                price_poisha: Money::from_taka(price).poisha(),
                stock: 100,
                is_pack: false,
                image_url: None,
                is_active: true,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                variants: Vec::new(),
            })
            .await
            .unwrap();
    }

    let (_dispatcher, notifications) =
        NotificationDispatcher::new(db.clone(), Arc::new(LogNotifier), 50, Duration::from_secs(5));
    let state = AppState::new(
        db.clone(),
        StorefrontsConfig::from_toml_str(STOREFRONTS).unwrap(),
        Arc::new(RateLimiter::new()),
        notifications,
    );

    TestApp {
        app: router(state),
        db,
    }
}

fn checkout_body(name: &str, phone: &str, product_id: &str, quantity: i64) -> Value {
    json!({
        "customer": {
            "name": name,
            "phone": phone,
            "address": "House 12, Road 5, Dhanmondi, Dhaka",
            "area": "inside",
            "email": "shopper@example.com"
        },
        "items": [{
            "productId": product_id,
            "name": "Cart name",
            "price": 1000,
            "quantity": quantity,
            "imageUrl": "/img/item.jpg"
        }],
        "total": 1080,
        "deliveryCharge": 80
    })
}

async fn send(app: &Router, method: &str, uri: &str, ip: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", ip)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn checkout(app: &Router, storefront: &str, ip: &str, body: Value) -> (StatusCode, Value) {
    send(app, "POST", &format!("/api/storefronts/{storefront}/checkout"), ip, Some(body)).await
}

async fn pending(db: &Database, storefront: &str, phone: &str) -> i64 {
    db.orders().count_pending_by_phone(storefront, phone).await.unwrap()
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_checkout_creates_order() {
    let t = setup().await;

    let (status, body) = checkout(
        &t.app,
        "stylehunt",
        "203.0.113.9",
        checkout_body("Rahim Uddin", "01712345678", "shirt", 1),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let order_id = body["orderId"].as_str().unwrap().to_string();

    let (status, order) = send(
        &t.app,
        "GET",
        &format!("/api/storefronts/stylehunt/orders/{order_id}"),
        "203.0.113.9",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["paymentMethod"], "COD");
    assert_eq!(order["customerPhone"], "01712345678");
    assert_eq!(order["total"], 1080.0);
    assert_eq!(order["items"][0]["name"], "Catalog shirt");
    assert_eq!(order["items"][0]["imageUrl"], "/img/item.jpg");

    assert_eq!(t.db.notification_outbox().count_pending().await.unwrap(), 1);
}

#[tokio::test]
async fn test_empty_name_is_rejected_without_order() {
    let t = setup().await;

    let (status, body) = checkout(
        &t.app,
        "stylehunt",
        "203.0.113.9",
        checkout_body("   ", "01712345678", "shirt", 1),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please fill in all fields: name is required");
    assert_eq!(pending(&t.db, "stylehunt", "01712345678").await, 0);
}

#[tokio::test]
async fn test_invalid_phone_and_short_address() {
    let t = setup().await;

    let (status, body) = checkout(
        &t.app,
        "stylehunt",
        "203.0.113.9",
        checkout_body("Rahim", "01212345678", "shirt", 1),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid Bangladeshi phone number");

    let mut short = checkout_body("Rahim", "01712345678", "shirt", 1);
    short["customer"]["address"] = json!("Dhaka");
    let (status, body) = checkout(&t.app, "stylehunt", "203.0.113.9", short).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please provide a more detailed address");
}

#[tokio::test]
async fn test_twenty_first_pending_order_is_rejected() {
    let t = setup().await;
    let phone = "01812345678";

    for i in 0..20 {
        let (status, _) = checkout(
            &t.app,
            "stylehunt",
            &format!("198.51.100.{i}"),
            checkout_body("Karim", phone, "shirt", 1),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = checkout(
        &t.app,
        "stylehunt",
        "198.51.100.200",
        checkout_body("Karim", phone, "shirt", 1),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "You have too many pending orders. Please wait for them to be processed."
    );
    assert_eq!(pending(&t.db, "stylehunt", phone).await, 20);
}

#[tokio::test]
async fn test_ip_rate_limit_returns_429() {
    let t = setup().await;

    for phone in ["01712345678", "01912345678"] {
        let (status, _) = checkout(
            &t.app,
            "tinyshop",
            "192.0.2.44",
            checkout_body("Rahim", phone, "mug", 1),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = checkout(
        &t.app,
        "tinyshop",
        "192.0.2.44",
        checkout_body("Rahim", "01512345678", "mug", 1),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Too many requests. Please try again later.");
    assert_eq!(pending(&t.db, "tinyshop", "01512345678").await, 0);

    // Another address is unaffected
    let (status, _) = checkout(
        &t.app,
        "tinyshop",
        "192.0.2.45",
        checkout_body("Rahim", "01512345678", "mug", 1),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_phone_rate_limit_returns_429() {
    let t = setup().await;
    let phone = "01712345678";

    for i in 0..3 {
        let (status, _) = checkout(
            &t.app,
            "phoneshop",
            &format!("192.0.2.{i}"),
            checkout_body("Rahim", phone, "cover", 1),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = checkout(
        &t.app,
        "phoneshop",
        "192.0.2.99",
        checkout_body("Rahim", phone, "cover", 1),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        body["error"],
        "Too many orders for this phone number. Please try again later."
    );
    assert_eq!(pending(&t.db, "phoneshop", phone).await, 3);
}

#[tokio::test]
async fn test_ip_rejected_attempt_uses_phone_window() {
    let t = setup().await;
    let phone = "01712345678";

    for _ in 0..2 {
        let (status, _) =
            checkout(&t.app, "phoneshop", "192.0.2.1", checkout_body("Rahim", phone, "cover", 1)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // Third attempt from the same address: IP window full, phone counted anyway
    let (status, body) =
        checkout(&t.app, "phoneshop", "192.0.2.1", checkout_body("Rahim", phone, "cover", 1)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Too many requests. Please try again later.");

    // So a fresh address is turned away on the phone window
    let (status, body) =
        checkout(&t.app, "phoneshop", "192.0.2.2", checkout_body("Rahim", phone, "cover", 1)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        body["error"],
        "Too many orders for this phone number. Please try again later."
    );
    assert_eq!(pending(&t.db, "phoneshop", phone).await, 2);
}

#[tokio::test]
async fn test_unknown_storefront_is_404() {
    let t = setup().await;

    let (status, body) = checkout(
        &t.app,
        "nosuchshop",
        "203.0.113.9",
        checkout_body("Rahim", "01712345678", "shirt", 1),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Storefront not found");
}

#[tokio::test]
async fn test_missing_brand_is_generic_500() {
    let t = setup().await;

    let (status, body) = checkout(
        &t.app,
        "nobrand",
        "203.0.113.9",
        checkout_body("Rahim", "01712345678", "shirt", 1),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["error"],
        "Something went wrong while placing your order. Please try again."
    );
}

#[tokio::test]
async fn test_missing_product_and_short_stock() {
    let t = setup().await;

    let (status, body) = checkout(
        &t.app,
        "stylehunt",
        "203.0.113.9",
        checkout_body("Rahim", "01712345678", "gone", 1),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Product 'Cart name' is not available. Please clear your cart and add it again."
    );

    let (status, body) = checkout(
        &t.app,
        "stylehunt",
        "203.0.113.9",
        checkout_body("Rahim", "01712345678", "shirt", 101),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Only 100 items available for 'Catalog shirt'");
    assert_eq!(pending(&t.db, "stylehunt", "01712345678").await, 0);
}

#[tokio::test]
async fn test_flat_stock_is_shared_across_sizes() {
    let t = setup().await;

    let mut body = checkout_body("Rahim", "01712345678", "shirt", 60);
    body["items"] = json!([
        { "productId": "shirt", "name": "Shirt", "price": 1000, "quantity": 60, "selectedSize": "S" },
        { "productId": "shirt", "name": "Shirt", "price": 1000, "quantity": 60, "selectedSize": "M" }
    ]);
    let (status, body) = checkout(&t.app, "stylehunt", "203.0.113.9", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Only 100 items available for 'Catalog shirt'");
    assert_eq!(pending(&t.db, "stylehunt", "01712345678").await, 0);

    let shirt = t.db.products().get("stylehunt", "shirt").await.unwrap().unwrap();
    assert_eq!(shirt.stock, 100);
}

#[tokio::test]
async fn test_required_fields_are_checked_before_area_and_prices() {
    let t = setup().await;

    let mut bad_area = checkout_body("", "01712345678", "shirt", 1);
    bad_area["customer"]["area"] = json!("mars");
    let (status, body) = checkout(&t.app, "stylehunt", "203.0.113.9", bad_area.clone()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please fill in all fields: name is required");

    let mut bad_price = checkout_body("", "01712345678", "shirt", 1);
    bad_price["items"][0]["price"] = json!(-5);
    let (status, body) = checkout(&t.app, "stylehunt", "203.0.113.9", bad_price.clone()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please fill in all fields: name is required");

    // With the name filled in, each reaches its own step
    bad_area["customer"]["name"] = json!("Rahim");
    let (_, body) = checkout(&t.app, "stylehunt", "203.0.113.9", bad_area).await;
    assert_eq!(body["error"], "Please select a delivery area");

    bad_price["customer"]["name"] = json!("Rahim");
    let (_, body) = checkout(&t.app, "stylehunt", "203.0.113.9", bad_price).await;
    assert_eq!(body["error"], "price cannot be negative");
}

#[tokio::test]
async fn test_invalid_client_total_is_ignored() {
    let t = setup().await;

    let mut body = checkout_body("Rahim", "01712345678", "shirt", 1);
    body["total"] = json!(-1);
    body["deliveryCharge"] = json!(-80);
    let (status, _) = checkout(&t.app, "stylehunt", "203.0.113.9", body).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(pending(&t.db, "stylehunt", "01712345678").await, 1);
}

#[tokio::test]
async fn test_oversized_carts_are_rejected() {
    let t = setup().await;
    let line = json!({ "productId": "shirt", "name": "Shirt", "price": 1e12, "quantity": 999 });

    let mut body = checkout_body("Rahim", "01712345678", "shirt", 1);
    body["items"] = Value::Array(vec![line.clone(); 100]);
    let (status, response) = checkout(&t.app, "stylehunt", "203.0.113.9", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "price must be between 0 and 10000000");

    let mut body = checkout_body("Rahim", "01712345678", "shirt", 1);
    body["items"] = Value::Array(vec![line; 101]);
    let (status, response) = checkout(&t.app, "stylehunt", "203.0.113.9", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "Cart cannot have more than 100 items");
    assert_eq!(pending(&t.db, "stylehunt", "01712345678").await, 0);
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let t = setup().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/storefronts/stylehunt/checkout")
        .header("content-type", "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = t.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Quote, order lookup, health
// =============================================================================

#[tokio::test]
async fn test_quote_uses_catalog_and_policy() {
    let t = setup().await;

    let (status, quote) = send(
        &t.app,
        "POST",
        "/api/storefronts/bengolsale/quote",
        "203.0.113.9",
        Some(json!({
            "items": [{ "productId": "roll", "name": "Roll", "price": 1, "quantity": 5 }],
            "area": "outside"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["subtotal"], 1250.0);
    assert_eq!(quote["deliveryCharge"], 0.0);
    assert_eq!(quote["freeDelivery"], true);

    let (_, quote) = send(
        &t.app,
        "POST",
        "/api/storefronts/stylehunt/quote",
        "203.0.113.9",
        Some(json!({
            "items": [{ "productId": "shirt", "name": "Shirt", "price": 1000, "quantity": 2 }],
            "area": "outside"
        })),
    )
    .await;
    assert_eq!(quote["discount"], 0.0);
    assert_eq!(quote["deliveryCharge"], 120.0);
    assert_eq!(quote["total"], 2120.0);
}

#[tokio::test]
async fn test_unknown_order_is_404() {
    let t = setup().await;

    let (status, body) = send(
        &t.app,
        "GET",
        "/api/storefronts/stylehunt/orders/does-not-exist",
        "203.0.113.9",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Order not found");
}

#[tokio::test]
async fn test_health_endpoints() {
    let t = setup().await;

    let response = t
        .app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, body) = send(&t.app, "GET", "/health/ready", "203.0.113.9", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "ok");
    assert_eq!(body["storefronts"], 5);
}
