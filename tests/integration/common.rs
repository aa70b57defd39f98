//! Shared fixtures for the integration tests.

use std::{
    sync::{Arc, Once},
    time::Duration,
};

use storefront::{
    CatalogSession, FeedConfig, Storefront,
    feed::FeedSnapshot,
    query::MemoryLocation,
    testing::mock_backend,
    transport::MockTransport,
};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Installs a test-writer subscriber once; honors `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A storefront over the sample catalog, plus its backend.
pub struct Shop {
    pub backend: Arc<MockTransport>,
    pub store: Storefront,
}

impl Shop {
    pub fn new() -> Self {
        Self::with_config(FeedConfig::default())
    }

    pub fn with_config(config: FeedConfig) -> Self {
        init_tracing();
        let backend = mock_backend();
        let store = Storefront::builder()
            .transport(backend.clone())
            .feed_config(config)
            .build()
            .expect("mock storefront should build");
        Self { backend, store }
    }

    /// Opens a catalog page at `query`.
    pub fn open(&self, query: &str) -> (Arc<MemoryLocation>, CatalogSession) {
        let location = Arc::new(MemoryLocation::new(query));
        let session = self.store.catalog(location.clone());
        (location, session)
    }
}

/// Lets background tasks run, then waits until the feed has nothing in flight.
pub async fn settled(session: &CatalogSession) -> FeedSnapshot {
    tokio::time::sleep(Duration::from_millis(1)).await;
    let mut rx = session.subscribe();
    tokio::time::timeout(
        Duration::from_secs(30),
        rx.wait_for(|s| !s.status.is_loading()),
    )
    .await
    .expect("feed did not settle")
    .expect("feed dropped")
    .clone()
}
