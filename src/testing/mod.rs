//! Fixtures for testing applications built on the storefront client.
//!
//! - [`sample_catalog`]: a deterministic 45-product catalog
//! - [`mock_backend`]: a [`MockTransport`](crate::transport::MockTransport)
//!   serving that catalog, with order failures switched off
//! - [`sample_shipping`] / [`sample_card`]: checkout forms that pass validation
//!
//! ## Quick Start
//!
//! ```rust
//! # tokio_test::block_on(async {
//! use storefront::testing::{mock_backend, sample_product};
//! use storefront::{FilterState, ProductQuery, StoreTransport};
//!
//! let backend = mock_backend();
//! let query = ProductQuery::new(FilterState::default(), 0, 20);
//! let page = backend.list_products(&query).await.unwrap();
//! assert_eq!(page.total, 45);
//! assert_eq!(sample_product(7).category, "phones");
//! # });
//! ```

mod fixtures;

pub use fixtures::{mock_backend, sample_card, sample_catalog, sample_product, sample_shipping};
