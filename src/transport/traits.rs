//! Transport trait definitions and common types.

use crate::error::Result;
use crate::types::{Cart, CartMutation, OrderReceipt, OrderRequest, ProductPage, ProductQuery};

/// Available transport implementations.
///
/// ```rust
/// use storefront::TransportKind;
///
/// assert!(TransportKind::Http.is_http());
/// assert_eq!(TransportKind::Mock.to_string(), "Mock");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportKind {
    /// REST over HTTP.
    #[default]
    Http,
    /// In-memory backend, for tests and demos.
    Mock,
}

impl TransportKind {
    /// Returns `true` if this is HTTP/REST transport.
    pub fn is_http(&self) -> bool {
        matches!(self, TransportKind::Http)
    }

    /// Returns `true` if this is the in-memory backend.
    pub fn is_mock(&self) -> bool {
        matches!(self, TransportKind::Mock)
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::Http => write!(f, "HTTP/REST"),
            TransportKind::Mock => write!(f, "Mock"),
        }
    }
}

/// The storefront REST contract.
///
/// Implemented by [`RestTransport`](crate::transport::RestTransport) and
/// [`MockTransport`](crate::transport::MockTransport). Dropping a returned
/// future abandons the request; the feed relies on that to supersede fetches.
#[async_trait::async_trait]
pub trait StoreTransport: Send + Sync {
    /// `GET /products`
    async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage>;

    /// `GET /cart`
    async fn get_cart(&self) -> Result<Cart>;

    /// `POST /cart` with a signed quantity delta; returns the authoritative cart.
    async fn update_cart(&self, mutation: CartMutation) -> Result<Cart>;

    /// `POST /orders`
    async fn place_order(&self, order: &OrderRequest) -> Result<OrderReceipt>;

    /// Returns which implementation this is.
    fn transport_kind(&self) -> TransportKind;
}
