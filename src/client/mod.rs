//! The storefront client and its catalog sessions.
//!
//! - [`Storefront`]: owns the backend and the shared cart
//! - [`CatalogSession`]: one catalog page, wiring URL filters, debounced
//!   inputs, the product feed and the cart together
//!
//! ## Quick Start
//!
//! ```rust
//! # tokio_test::block_on(async {
//! use std::sync::Arc;
//! use storefront::query::MemoryLocation;
//! use storefront::testing::sample_catalog;
//! use storefront::transport::MockTransport;
//! use storefront::Storefront;
//!
//! let store = Storefront::builder()
//!     .transport(Arc::new(MockTransport::with_catalog(sample_catalog())))
//!     .build()
//!     .unwrap();
//!
//! let session = store.catalog(Arc::new(MemoryLocation::new("category=audio")));
//! assert_eq!(session.filters().category.as_deref(), Some("audio"));
//! # });
//! ```

mod builder;
mod inner;
mod session;

pub use builder::{DEFAULT_TIMEOUT, HasBackend, NoBackend, StorefrontBuilder};
pub use session::CatalogSession;

pub(crate) use inner::StorefrontInner;

use std::sync::Arc;

use crate::{
    cart::CartController,
    checkout::{CheckoutWizard, KeyValueStore},
    config::{FeedConfig, RetryConfig},
    feed::ProductFeed,
    query::Location,
    transport::{StoreTransport, TransportKind},
};

/// Entry point: a configured backend plus the cart shared by every page.
///
/// `Storefront` is `Clone`; clones share the same backend and cart.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

impl Storefront {
    /// Creates a new storefront builder.
    pub fn builder() -> StorefrontBuilder<NoBackend> {
        StorefrontBuilder::new()
    }

    pub(crate) fn from_inner(inner: StorefrontInner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// The backend.
    pub fn transport(&self) -> &Arc<dyn StoreTransport> {
        &self.inner.transport
    }

    /// Which backend implementation is in use.
    pub fn transport_kind(&self) -> TransportKind {
        self.inner.transport.transport_kind()
    }

    /// Feed settings applied to new sessions.
    pub fn feed_config(&self) -> &FeedConfig {
        &self.inner.feed_config
    }

    /// Retry settings for idempotent reads.
    pub fn retry_config(&self) -> &RetryConfig {
        &self.inner.retry_config
    }

    /// The shared cart.
    pub fn cart(&self) -> &CartController {
        &self.inner.cart
    }

    /// A standalone product feed, not bound to any location.
    pub fn feed(&self) -> ProductFeed {
        ProductFeed::new(Arc::clone(&self.inner.transport), &self.inner.feed_config)
    }

    /// Opens a catalog page whose filters live in `location`.
    ///
    /// Starts loading the first page immediately. Must be called within a
    /// Tokio runtime.
    pub fn catalog(&self, location: Arc<dyn Location>) -> CatalogSession {
        CatalogSession::new(
            Arc::clone(&self.inner.transport),
            self.inner.cart.clone(),
            location,
            &self.inner.feed_config,
        )
    }

    /// Starts a checkout that persists its forms in `store`.
    pub fn checkout(&self, store: Arc<dyn KeyValueStore>) -> CheckoutWizard {
        CheckoutWizard::new(Arc::clone(&self.inner.transport), store)
    }
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("transport", &self.transport_kind())
            .field("page_size", &self.inner.feed_config.page_size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::MemoryStore;
    use crate::testing::{mock_backend, sample_product};

    fn store() -> (Arc<crate::transport::MockTransport>, Storefront) {
        let backend = mock_backend();
        let store = Storefront::builder()
            .transport(backend.clone())
            .build()
            .unwrap();
        (backend, store)
    }

    #[test]
    fn test_debug_hides_internals() {
        let (_, store) = store();
        let debug = format!("{store:?}");
        assert!(debug.contains("Mock"));
        assert!(debug.contains("page_size: 20"));
    }

    #[tokio::test]
    async fn test_clones_share_the_cart() {
        let (backend, store) = store();
        let clone = store.clone();

        let outcome = store.cart().add(&sample_product(3)).await.unwrap();
        assert!(outcome.is_committed());
        assert_eq!(clone.cart().cart().quantity_of(3), 1);
        assert_eq!(backend.cart().quantity_of(3), 1);
    }

    #[tokio::test]
    async fn test_standalone_feed_uses_configured_page_size() {
        let backend = mock_backend();
        let store = Storefront::builder()
            .transport(backend)
            .feed_config(FeedConfig::builder().page_size(5).build())
            .build()
            .unwrap();

        let feed = store.feed();
        assert!(feed.reset(Default::default()).run().await.is_loaded());
        assert_eq!(feed.snapshot().items.len(), 5);
    }

    #[test]
    fn test_checkout_starts_at_shipping() {
        let (_, store) = store();
        let wizard = store.checkout(Arc::new(MemoryStore::new()));
        assert_eq!(wizard.step(), crate::checkout::CheckoutStep::Shipping);
    }
}
