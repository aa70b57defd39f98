//! Checkout from a filled cart to confirmation.

use std::{sync::Arc, time::Duration};

use storefront::{
    ErrorKind, PaymentMethod,
    checkout::{CheckoutStep, FileStore, KeyValueStore, PAYMENT_KEY, PaymentDetails, SHIPPING_KEY},
    testing::{sample_card, sample_product, sample_shipping},
    transport::MockRequest,
};

use crate::common::{Shop, settled};

#[tokio::test(start_paused = true)]
async fn test_order_empties_cart_everywhere() {
    let shop = Shop::new();
    let (_, session) = shop.open("category=cameras");
    settled(&session).await;

    let camera = sample_product(14);
    session.add_to_cart(&camera, 2).await.unwrap();
    session.add_to_cart(&sample_product(17), 1).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::new(dir.path().join("checkout.json")));
    let mut wizard = shop.store.checkout(store.clone());

    wizard.set_shipping(sample_shipping());
    assert_eq!(wizard.next().unwrap(), CheckoutStep::Payment);
    wizard.set_payment(sample_card());
    assert_eq!(wizard.next().unwrap(), CheckoutStep::Review);

    let receipt = wizard.place_order(shop.store.cart()).await.unwrap();
    assert!(receipt.order_id.is_some());
    assert_eq!(wizard.step(), CheckoutStep::Confirmation);

    let order = shop
        .backend
        .requests()
        .into_iter()
        .find_map(|r| match r {
            MockRequest::PlaceOrder(order) => Some(order),
            _ => None,
        })
        .unwrap();
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.total_price, 2.0 * 449.0 + 59.0);
    assert_eq!(order.payment_method, PaymentMethod::Card);

    assert!(shop.store.cart().cart().is_empty());
    assert!(shop.backend.cart().is_empty());
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert!(session.snapshot().items.iter().all(|p| p.item_in_cart == 0));

    assert_eq!(store.get(SHIPPING_KEY).unwrap(), None);
    assert_eq!(store.get(PAYMENT_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_reload_resumes_without_card_data() {
    let shop = Shop::new();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("checkout.json");

    {
        let mut wizard = shop.store.checkout(Arc::new(FileStore::new(&path)));
        wizard.set_shipping(sample_shipping());
        wizard.next().unwrap();
        wizard.set_payment(sample_card());
    }

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(!raw.contains("4242 4242"));
    assert!(!raw.contains("12/99"));

    let mut wizard = shop.store.checkout(Arc::new(FileStore::new(&path)));
    assert_eq!(wizard.step(), CheckoutStep::Shipping);
    assert_eq!(wizard.shipping(), &sample_shipping());
    assert_eq!(wizard.payment().cardholder_name, "Grace Hopper");

    // The card number has to be typed again.
    wizard.next().unwrap();
    let err = wizard.next().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(wizard.field_errors().contains("card_number"));
}

#[tokio::test]
async fn test_failed_order_can_be_retried() {
    let shop = Shop::new();
    shop.store.cart().add(&sample_product(20)).await.unwrap();
    shop.backend.set_order_failure_rate(1.0);

    let dir = tempfile::tempdir().unwrap();
    let mut wizard = shop
        .store
        .checkout(Arc::new(FileStore::new(dir.path().join("c.json"))));
    wizard.set_shipping(sample_shipping());
    wizard.next().unwrap();
    wizard.set_payment(PaymentDetails::without_card(PaymentMethod::CashOnDelivery));
    wizard.next().unwrap();

    let err = wizard.place_order(shop.store.cart()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(wizard.step(), CheckoutStep::Review);
    assert_eq!(shop.store.cart().cart().total_items(), 1);

    shop.backend.set_order_failure_rate(0.0);
    wizard.place_order(shop.store.cart()).await.unwrap();
    assert_eq!(wizard.attempts(), 2);
    assert_eq!(wizard.step(), CheckoutStep::Confirmation);
}
