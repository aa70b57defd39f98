//! Catalog page scenarios: search, debounce, pagination, supersession.

use std::{sync::Arc, time::Duration};

use storefront::{
    Error, FeedConfig, HistoryMode, SortKey,
    feed::FeedStatus,
    query::Location,
    viewport::ManualObserver,
};

use crate::common::{Shop, settled};

async fn wait(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn test_search_with_single_short_page() {
    let shop = Shop::new();
    let (location, session) = shop.open("");
    settled(&session).await;
    shop.backend.clear_requests();

    session.type_search("lap");
    wait(450).await;
    let snapshot = settled(&session).await;

    assert_eq!(location.query(), "q=lap");
    let queries = shop.backend.product_queries();
    assert_eq!(queries.len(), 1);
    let pairs = queries[0].to_pairs();
    assert_eq!(pairs[0], ("page", "0".to_string()));
    assert_eq!(pairs[1], ("limit", "20".to_string()));
    assert_eq!(pairs[2], ("q", "lap".to_string()));
    assert!(queries[0].filters.category.is_none());

    assert_eq!(snapshot.items.len(), 5);
    assert!(!snapshot.cursor.has_more);
    assert_eq!(snapshot.status, FeedStatus::Exhausted);

    // Further scrolling requests nothing.
    assert!(!session.load_more());
    wait(10).await;
    assert_eq!(shop.backend.product_queries().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_keystrokes_within_window_issue_one_fetch() {
    let shop = Shop::new();
    let (location, session) = shop.open("");
    settled(&session).await;
    shop.backend.clear_requests();

    session.type_search("a");
    wait(100).await;
    session.type_search("ab");
    assert_eq!(session.search_input(), "ab");
    wait(450).await;
    settled(&session).await;

    let queries = shop.backend.product_queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].filters.search_query, "ab");
    assert_eq!(location.query(), "q=ab");
}

#[tokio::test(start_paused = true)]
async fn test_scrolling_loads_until_exhausted() {
    let shop = Shop::new();
    let (_, session) = shop.open("");
    assert_eq!(settled(&session).await.items.len(), 20);

    let observer = Arc::new(ManualObserver::new());
    let mut driver = session.pagination_driver(observer.clone());
    driver.attach(1);

    observer.set_visible(1, true);
    assert_eq!(settled(&session).await.items.len(), 40);

    observer.set_visible(1, false);
    observer.set_visible(1, true);
    let snapshot = settled(&session).await;
    assert_eq!(snapshot.items.len(), 45);
    assert_eq!(snapshot.status, FeedStatus::Exhausted);

    let requests = shop.backend.product_queries().len();
    observer.set_visible(1, false);
    observer.set_visible(1, true);
    settled(&session).await;
    assert_eq!(shop.backend.product_queries().len(), requests);
    assert_eq!(driver.triggers(), 2);

    let pages: Vec<u32> = shop
        .backend
        .product_queries()
        .iter()
        .map(|q| q.page)
        .collect();
    assert_eq!(pages, [0, 1, 2]);
}

#[tokio::test(start_paused = true)]
async fn test_sentinel_still_in_view_needs_recheck() {
    let shop = Shop::with_config(FeedConfig::builder().page_size(4).build());
    let (_, session) = shop.open("category=laptops");
    settled(&session).await;

    let observer = Arc::new(ManualObserver::new());
    let mut driver = session.pagination_driver(observer.clone());
    driver.attach(9);
    observer.set_visible(9, true);
    assert_eq!(settled(&session).await.items.len(), 7);

    // No new visibility event arrives while the sentinel stays in view.
    assert!(!driver.recheck());
    assert_eq!(session.snapshot().status, FeedStatus::Exhausted);
}

#[tokio::test(start_paused = true)]
async fn test_filter_change_supersedes_in_flight_fetch() {
    let shop = Shop::new();
    shop.backend.set_latency(Duration::from_millis(200));
    let (_, session) = shop.open("q=cam");
    wait(50).await;
    assert_eq!(session.snapshot().status, FeedStatus::LoadingInitial);

    assert!(session.set_category(Some("audio".into())));
    let snapshot = settled(&session).await;

    assert_eq!(snapshot.filters.category.as_deref(), Some("audio"));
    assert_eq!(snapshot.filters.search_query, "cam");
    assert!(snapshot.items.is_empty());
    assert_eq!(snapshot.status, FeedStatus::Exhausted);

    // The first page of the stale filter set never lands.
    wait(500).await;
    assert!(session.snapshot().items.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_history_navigation_drives_the_feed() {
    let shop = Shop::with_config(FeedConfig::builder().history_mode(HistoryMode::Push).build());
    let (location, session) = shop.open("utm_source=mail");
    settled(&session).await;

    session.set_category(Some("cameras".into()));
    session.set_sort(SortKey::PriceDesc);
    let snapshot = settled(&session).await;
    assert_eq!(
        location.query(),
        "utm_source=mail&category=cameras&sort=price_desc"
    );
    assert_eq!(snapshot.items[0].name, "Cinema Camera");
    assert_eq!(snapshot.max_price, Some(3999.0));
    assert_eq!(location.history_len(), 3);

    assert!(location.back());
    assert!(location.back());
    let snapshot = settled(&session).await;
    assert_eq!(location.query(), "utm_source=mail");
    assert_eq!(snapshot.filters.category, None);
    assert_eq!(snapshot.items.len(), 20);
}

#[tokio::test(start_paused = true)]
async fn test_failed_page_keeps_items_and_retries() {
    let shop = Shop::new();
    let (_, session) = shop.open("");
    settled(&session).await;

    shop.backend.fail_next(Error::unavailable("backend restarting"));
    assert!(session.load_more());
    let snapshot = settled(&session).await;
    assert_eq!(snapshot.status, FeedStatus::Error);
    assert_eq!(snapshot.items.len(), 20);
    assert!(snapshot.error.is_some());
    assert!(!session.load_more());

    assert!(session.retry());
    let snapshot = settled(&session).await;
    assert_eq!(snapshot.items.len(), 40);
    assert!(snapshot.error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_price_bounds_round_trip_through_url() {
    let shop = Shop::new();
    let (location, session) = shop.open("minPrice=abc&maxPrice=100");
    let snapshot = settled(&session).await;
    assert_eq!(snapshot.filters.min_price, None);
    assert!(snapshot.items.iter().all(|p| p.price <= 100.0));
    assert_eq!(session.price_input(), (None, Some(100.0)));

    session.set_price_range(Some(20.0), Some(60.0));
    wait(450).await;
    let snapshot = settled(&session).await;
    assert_eq!(location.query(), "minPrice=20&maxPrice=60");
    assert!(
        snapshot
            .items
            .iter()
            .all(|p| (20.0..=60.0).contains(&p.price))
    );
}
