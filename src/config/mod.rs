//! Configuration types for the storefront client.
//!
//! - [`RetryConfig`]: backoff for idempotent requests
//! - [`FeedConfig`]: page size, debounce windows and history mode for the catalog

mod feed;
mod retry;

pub use feed::{DEFAULT_DEBOUNCE, DEFAULT_PAGE_SIZE, FeedConfig};
pub use retry::RetryConfig;
