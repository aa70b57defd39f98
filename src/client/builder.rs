//! Storefront builder with typestate pattern.

use std::{marker::PhantomData, sync::Arc, time::Duration};

use super::{Storefront, StorefrontInner};
#[cfg(feature = "rest")]
use crate::transport::RestTransport;
use crate::{
    Error,
    cart::CartController,
    config::{FeedConfig, RetryConfig},
    transport::StoreTransport,
};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Marker type: backend not yet provided.
pub struct NoBackend;

/// Marker type: backend has been provided.
pub struct HasBackend;

enum Backend {
    #[cfg_attr(not(feature = "rest"), allow(dead_code))]
    Url(String),
    Transport(Arc<dyn StoreTransport>),
}

/// Builder for creating [`Storefront`] instances.
///
/// Uses the typestate pattern so a storefront cannot be built without a
/// backend.
///
/// ## Required Configuration
///
/// - `url()`: the storefront API base URL, or
/// - `transport()`: any [`StoreTransport`], e.g. a
///   [`MockTransport`](crate::transport::MockTransport)
///
/// ## Optional Configuration
///
/// - `retry_config()`: backoff for idempotent reads (REST only)
/// - `feed_config()`: page size, debounce windows, history mode
/// - `timeout()`: per-request timeout (REST only)
///
/// ## Example
///
/// ```rust
/// use std::time::Duration;
/// use storefront::{FeedConfig, RetryConfig, Storefront};
///
/// let store = Storefront::builder()
///     .url("http://localhost:3001/api")
///     .retry_config(RetryConfig::new().with_max_retries(5))
///     .feed_config(FeedConfig::builder().page_size(12).build())
///     .timeout(Duration::from_secs(10))
///     .build()
///     .unwrap();
/// assert_eq!(store.feed_config().page_size, 12);
/// ```
pub struct StorefrontBuilder<BackendState> {
    backend: Option<Backend>,
    retry_config: RetryConfig,
    feed_config: FeedConfig,
    timeout: Duration,
    _backend_state: PhantomData<BackendState>,
}

impl StorefrontBuilder<NoBackend> {
    /// Creates a new storefront builder.
    pub fn new() -> Self {
        Self {
            backend: None,
            retry_config: RetryConfig::default(),
            feed_config: FeedConfig::default(),
            timeout: DEFAULT_TIMEOUT,
            _backend_state: PhantomData,
        }
    }

    /// Sets the storefront API base URL (e.g. `http://localhost:3001/api`).
    #[cfg(feature = "rest")]
    pub fn url(self, url: impl Into<String>) -> StorefrontBuilder<HasBackend> {
        self.with_backend(Backend::Url(url.into()))
    }

    /// Uses `transport` as the backend.
    pub fn transport(self, transport: Arc<dyn StoreTransport>) -> StorefrontBuilder<HasBackend> {
        self.with_backend(Backend::Transport(transport))
    }

    fn with_backend(self, backend: Backend) -> StorefrontBuilder<HasBackend> {
        StorefrontBuilder {
            backend: Some(backend),
            retry_config: self.retry_config,
            feed_config: self.feed_config,
            timeout: self.timeout,
            _backend_state: PhantomData,
        }
    }
}

impl Default for StorefrontBuilder<NoBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> StorefrontBuilder<B> {
    /// Sets the retry configuration for idempotent reads.
    #[must_use]
    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Sets the feed configuration.
    #[must_use]
    pub fn feed_config(mut self, config: FeedConfig) -> Self {
        self.feed_config = config;
        self
    }

    /// Sets the request timeout.
    ///
    /// This timeout applies to individual requests, not including retries.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl StorefrontBuilder<HasBackend> {
    /// Validates the configuration and builds the storefront.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error for an invalid URL, a zero timeout or an
    /// invalid [`FeedConfig`].
    pub fn build(self) -> Result<Storefront, Error> {
        self.feed_config.validate()?;
        if self.timeout.is_zero() {
            return Err(Error::configuration("timeout must be greater than zero"));
        }

        let transport = match self.backend {
            #[cfg(feature = "rest")]
            Some(Backend::Url(url)) => {
                let rest = RestTransport::builder()
                    .base_url(&url)
                    .map_err(|e| {
                        Error::configuration(format!("Invalid URL '{}': {}", url, e.message()))
                    })?
                    .retry_config(self.retry_config.clone())
                    .timeout(self.timeout)
                    .build()?;
                Arc::new(rest) as Arc<dyn StoreTransport>
            }
            #[cfg(not(feature = "rest"))]
            Some(Backend::Url(_)) => {
                return Err(Error::configuration(
                    "URL backend requested but 'rest' feature is not enabled",
                ));
            }
            Some(Backend::Transport(transport)) => transport,
            None => return Err(Error::configuration("a backend is required")),
        };

        tracing::debug!(
            transport = %transport.transport_kind(),
            page_size = self.feed_config.page_size,
            "storefront built"
        );

        Ok(Storefront::from_inner(StorefrontInner {
            cart: CartController::new(Arc::clone(&transport)),
            transport,
            feed_config: self.feed_config,
            retry_config: self.retry_config,
        }))
    }
}
