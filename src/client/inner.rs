//! Shared state behind a [`Storefront`](super::Storefront) handle.

use std::sync::Arc;

use crate::{
    cart::CartController,
    config::{FeedConfig, RetryConfig},
    transport::StoreTransport,
};

/// Everything the storefront's handles share.
///
/// One cart per storefront: the catalog feed, the cart page and checkout all
/// observe the same [`CartController`].
pub(crate) struct StorefrontInner {
    pub(crate) transport: Arc<dyn StoreTransport>,
    pub(crate) feed_config: FeedConfig,
    pub(crate) retry_config: RetryConfig,
    pub(crate) cart: CartController,
}
