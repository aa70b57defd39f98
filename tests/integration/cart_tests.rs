//! Optimistic cart scenarios seen through a catalog page.

use std::time::Duration;

use storefront::{
    Cart, CartLine, Error, ErrorKind, Product,
    cart::{CartNotice, MutationOutcome},
    testing::sample_product,
};

use crate::common::{Shop, settled};

fn item(session: &storefront::CatalogSession, id: u64) -> Product {
    session
        .snapshot()
        .items
        .into_iter()
        .find(|p| p.id == id)
        .expect("product should be listed")
}

#[tokio::test(start_paused = true)]
async fn test_server_error_reverts_quantity() {
    let shop = Shop::new();
    let (_, session) = shop.open("category=phones");
    settled(&session).await;
    let phone = sample_product(7);

    assert!(session.add_to_cart(&phone, 1).await.unwrap().is_committed());
    assert_eq!(item(&session, 7).item_in_cart, 1);

    let mut notices = shop.store.cart().notices();
    shop.backend.set_latency(Duration::from_millis(100));
    shop.backend
        .fail_next(Error::internal("Internal Server Error").with_status(500));

    let cart = shop.store.cart().clone();
    let clicked = phone.clone();
    let mutation = tokio::spawn(async move { cart.add(&clicked).await });

    tokio::time::sleep(Duration::from_millis(10)).await;
    let during = item(&session, 7);
    assert_eq!(during.item_in_cart, 2);
    assert!(during.loading);

    let outcome = mutation.await.unwrap().unwrap();
    assert!(matches!(outcome, MutationOutcome::RolledBack(_)));
    assert_eq!(outcome.error().and_then(Error::status), Some(500));

    tokio::time::sleep(Duration::from_millis(1)).await;
    let after = item(&session, 7);
    assert_eq!(after.item_in_cart, 1);
    assert!(!after.loading);
    assert_eq!(shop.store.cart().cart().quantity_of(7), 1);

    let CartNotice::RolledBack {
        product_id, delta, ..
    } = notices.recv().await.unwrap();
    assert_eq!((product_id, delta), (7, 1));
}

#[tokio::test(start_paused = true)]
async fn test_second_click_while_pending_is_rejected() {
    let shop = Shop::new();
    shop.backend.set_latency(Duration::from_millis(100));
    let cart = shop.store.cart().clone();
    let phone = sample_product(7);

    let first = tokio::spawn({
        let cart = cart.clone();
        let phone = phone.clone();
        async move { cart.add(&phone).await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;

    let err = cart.add(&phone).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Busy);
    assert!(cart.is_pending(7));

    // Other products are independent.
    assert!(cart.add(&sample_product(3)).await.unwrap().is_committed());

    assert!(first.await.unwrap().unwrap().is_committed());
    assert_eq!(cart.cart().quantity_of(7), 1);
    assert_eq!(shop.backend.cart().total_items(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_failure_keeps_concurrent_success() {
    let shop = Shop::new();
    shop.backend.set_latency(Duration::from_millis(50));
    let cart = shop.store.cart();
    let ghost = Product::new(999, "Discontinued Widget", 10.0, "accessories");
    let hub = sample_product(27);

    let (failed, committed) = tokio::join!(cart.add(&ghost), cart.add(&hub));

    let failed = failed.unwrap();
    assert_eq!(failed.error().map(Error::kind), Some(ErrorKind::NotFound));
    assert!(committed.unwrap().is_committed());

    let local = cart.cart();
    assert_eq!(local.quantity_of(999), 0);
    assert_eq!(local.quantity_of(27), 1);
    assert!(!cart.is_pending(999));
    assert!(!cart.is_pending(27));
}

#[tokio::test(start_paused = true)]
async fn test_load_adopts_server_cart() {
    let shop = Shop::new();
    let (_, session) = shop.open("category=audio");
    settled(&session).await;

    let mic = sample_product(5);
    shop.backend.set_cart(Cart::from_lines([CartLine {
        product: mic.clone(),
        quantity: 3,
    }]));

    let cart = shop.store.cart().load().await.unwrap();
    assert_eq!(cart.total_items(), 3);
    assert_eq!(cart.total_price(), 117.0);

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(item(&session, 5).item_in_cart, 3);

    assert!(
        session
            .add_to_cart(&mic, -3)
            .await
            .unwrap()
            .is_committed()
    );
    assert!(shop.store.cart().cart().is_empty());
    assert_eq!(item(&session, 5).item_in_cart, 0);
}

#[tokio::test]
async fn test_invalid_mutations_touch_nothing() {
    let shop = Shop::new();
    let cart = shop.store.cart();
    let phone = sample_product(7);

    let err = cart.update_quantity(&phone, 0).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    let err = cart.remove_one(&phone).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(shop.backend.request_count(), 0);
}
