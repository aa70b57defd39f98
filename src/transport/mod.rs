//! Transport layer for the storefront API.
//!
//! - REST transport (via reqwest), feature `rest` (default)
//! - Mock transport, an in-memory backend for tests and demos
//!
//! Higher layers only see the [`StoreTransport`] trait, so the feed, the
//! cart controller and the checkout wizard run unchanged against either.
//!
//! ## Transport Selection
//!
//! ```rust
//! use storefront::TransportKind;
//!
//! let http = TransportKind::Http;   // real backend
//! let mock = TransportKind::Mock;   // in-memory backend
//! assert_ne!(http, mock);
//! ```

mod traits;

#[cfg(feature = "rest")]
mod rest;

mod mock;

pub use mock::{DEFAULT_ORDER_FAILURE_RATE, MockRequest, MockTransport};
pub use traits::{StoreTransport, TransportKind};

#[cfg(feature = "rest")]
pub use rest::{RestStats, RestTransport, RestTransportBuilder};
