//! # Storefront
//!
//! Client-side engine for an e-commerce storefront: a paginated, filterable
//! product feed; filters kept in the URL query string; an optimistic cart;
//! and a multi-step checkout.
//!
//! ## Quick Start
//!
//! ```rust
//! # #[tokio::main(flavor = "current_thread", start_paused = true)]
//! # async fn main() -> Result<(), storefront::Error> {
//! use std::sync::Arc;
//! use storefront::prelude::*;
//! use storefront::testing::sample_catalog;
//!
//! let store = Storefront::builder()
//!     .transport(Arc::new(MockTransport::with_catalog(sample_catalog())))
//!     .build()?;
//!
//! // Filters live in the location's query string.
//! let location = Arc::new(MemoryLocation::new("category=laptops"));
//! let session = store.catalog(location.clone());
//!
//! let mut feed = session.subscribe();
//! feed.wait_for(|s| !s.status.is_loading()).await.ok();
//! let laptop = session.snapshot().items[0].clone();
//!
//! // The cart updates optimistically and rolls back on failure.
//! let outcome = session.add_to_cart(&laptop, 1).await?;
//! assert!(outcome.is_committed());
//! assert_eq!(store.cart().cart().total_items(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Key Concepts
//!
//! - **URL is the source of truth**: a catalog session reads its filters from
//!   a [`Location`](query::Location) and every change is written back there
//! - **Superseded fetches have no effect**: a filter change aborts the
//!   in-flight page request and starts over from page 0
//! - **Optimistic cart**: the cart changes at once; a failed request restores
//!   the affected line and publishes a [`CartNotice`](cart::CartNotice)
//!
//! ## Features
//!
//! - `rest` (default): REST transport via reqwest
//! - `rustls` (default): Use rustls for TLS
//! - `native-tls`: Use native TLS (OpenSSL on Linux, Secure Transport on macOS)

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

// Core modules
pub mod client;
pub mod config;
pub mod error;
pub mod types;

// Transport layer
pub mod transport;

// Catalog
pub mod debounce;
pub mod feed;
pub mod query;
pub mod viewport;

// Cart and checkout
pub mod cart;
pub mod checkout;

// Testing utilities
pub mod testing;

// Prelude for convenient imports
pub mod prelude;

#[cfg(feature = "rest")]
mod user_agent;

// Re-export main types at crate root for convenience
pub use client::{CatalogSession, Storefront, StorefrontBuilder};
pub use debounce::Debouncer;
pub use error::{Error, ErrorKind, Result, ValidationErrors};
pub use query::HistoryMode;
pub use transport::{StoreTransport, TransportKind};
pub use types::{
    Cart, CartLine, CartMutation, FilterPatch, FilterState, OrderItem, OrderReceipt, OrderRequest,
    PaymentMethod, Product, ProductId, ProductPage, ProductQuery, ShippingDetails, SortKey,
};

// Re-export config types
pub use config::{DEFAULT_DEBOUNCE, DEFAULT_PAGE_SIZE, FeedConfig, RetryConfig};
