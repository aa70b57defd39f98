//! The storefront against a REST backend served by wiremock.

use std::{sync::Arc, time::Duration};

use serde_json::json;
use storefront::{
    ErrorKind, FeedConfig, Product, RetryConfig, Storefront, TransportKind,
    feed::FeedStatus,
    query::MemoryLocation,
    testing::{sample_card, sample_shipping},
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, method, path, query_param},
};

use crate::common::{init_tracing, settled};

async fn storefront(server: &MockServer) -> Storefront {
    init_tracing();
    Storefront::builder()
        .url(format!("{}/api", server.uri()))
        .retry_config(RetryConfig::new().with_initial_delay(Duration::from_millis(5)))
        .feed_config(
            FeedConfig::builder()
                .search_debounce(Duration::from_millis(20))
                .build(),
        )
        .timeout(Duration::from_secs(5))
        .build()
        .expect("storefront should build")
}

fn laptop_json(id: u64, name: &str, price: f64) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "imageUrl": format!("/images/{id}.jpg"),
        "price": price,
        "category": "laptops",
        "itemInCart": 0
    })
}

#[tokio::test]
async fn test_catalog_page_over_rest() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("page", "0"))
        .and(query_param("limit", "20"))
        .and(query_param("q", "lap"))
        .and(query_param("sortBy", "price"))
        .and(query_param("sortOrder", "asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [
                laptop_json(1, "Laptop Air 13", 999.0),
                laptop_json(2, "Laptop Pro 14", 1899.0),
            ],
            "total": 2,
            "hasMore": false,
            "maxPriceChange": 1899.0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = storefront(&server).await;
    assert_eq!(store.transport_kind(), TransportKind::Http);

    let session = store.catalog(Arc::new(MemoryLocation::new("q=lap")));
    let snapshot = settled(&session).await;

    assert_eq!(snapshot.items.len(), 2);
    assert_eq!(snapshot.items[0].image_url, "/images/1.jpg");
    assert_eq!(snapshot.max_price, Some(1899.0));
    assert_eq!(snapshot.status, FeedStatus::Exhausted);
    assert!(!session.load_more());
}

#[tokio::test]
async fn test_missing_has_more_is_inferred_from_page_size() {
    let server = MockServer::start().await;
    let page: Vec<_> = (1..=20)
        .map(|id| laptop_json(id, &format!("Laptop {id}"), 500.0 + id as f64))
        .collect();

    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "products": page })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "products": [] })))
        .mount(&server)
        .await;

    let store = storefront(&server).await;
    let session = store.catalog(Arc::new(MemoryLocation::default()));

    let snapshot = settled(&session).await;
    assert_eq!(snapshot.items.len(), 20);
    assert!(snapshot.cursor.has_more);

    assert!(session.load_more());
    let snapshot = settled(&session).await;
    assert_eq!(snapshot.items.len(), 20);
    assert_eq!(snapshot.status, FeedStatus::Exhausted);
}

#[tokio::test]
async fn test_cart_rejection_rolls_back() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/cart"))
        .and(body_json(json!({ "productId": 7, "quantity": 1 })))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "error": "Internal Server Error" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = storefront(&server).await;
    let product = Product::new(7, "Phone Max", 1099.0, "phones");

    let outcome = store.cart().add(&product).await.unwrap();
    let error = outcome.error().unwrap();
    assert_eq!(error.kind(), ErrorKind::Internal);
    assert_eq!(error.status(), Some(500));
    assert_eq!(error.message(), "Internal Server Error");
    assert_eq!(store.cart().cart().quantity_of(7), 0);
    assert!(!store.cart().is_pending(7));
}

#[tokio::test]
async fn test_cart_adopts_flat_server_snapshot() {
    let server = MockServer::start().await;

    let mut line = laptop_json(2, "Laptop Pro 14", 1899.0);
    line["itemInCart"] = json!(2);
    Mock::given(method("POST"))
        .and(path("/api/cart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [line],
            "totalPrice": 3798.0,
            "totalItems": 2
        })))
        .mount(&server)
        .await;

    let store = storefront(&server).await;
    let product = Product::new(2, "Laptop Pro 14", 1899.0, "laptops");

    let outcome = store.cart().add(&product).await.unwrap();
    assert!(outcome.is_committed());
    let cart = store.cart().cart();
    assert_eq!(cart.quantity_of(2), 2);
    assert_eq!(cart.total_price(), 3798.0);
}

#[tokio::test]
async fn test_order_is_posted_without_card_number() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/cart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "product": laptop_json(1, "Laptop Air 13", 999.0), "quantity": 1 }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "orderId": "ord_42" })))
        .expect(1)
        .mount(&server)
        .await;

    let store = storefront(&server).await;
    store
        .cart()
        .add(&Product::new(1, "Laptop Air 13", 999.0, "laptops"))
        .await
        .unwrap();

    let mut wizard = store.checkout(Arc::new(storefront::checkout::MemoryStore::new()));
    wizard.set_shipping(sample_shipping());
    wizard.next().unwrap();
    wizard.set_payment(sample_card());
    wizard.next().unwrap();

    let receipt = wizard.place_order(store.cart()).await.unwrap();
    assert_eq!(receipt.order_id.as_deref(), Some("ord_42"));

    let requests = server.received_requests().await.unwrap();
    let order = requests
        .iter()
        .find(|r| r.url.path() == "/api/orders")
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&order.body).unwrap();
    assert_eq!(body["cardLast4"], "4242");
    assert_eq!(body["paymentMethod"], "card");
    assert!(!String::from_utf8_lossy(&order.body).contains("4242 4242"));
}
