//! In-memory storefront backend.
//!
//! Implements the same contract as the REST API: catalog filtering, sorting
//! and paging, a per-product cart, and order placement with a configurable
//! failure rate. Used by tests and demos in place of a server.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};

use super::traits::{StoreTransport, TransportKind};
use crate::error::{Error, Result};
use crate::types::{
    Cart, CartMutation, FilterState, OrderReceipt, OrderRequest, Product, ProductPage,
    ProductQuery, SortKey,
};

/// Fraction of orders the backend rejects unless configured otherwise.
pub const DEFAULT_ORDER_FAILURE_RATE: f64 = 0.5;

/// A request as the mock backend received it.
#[derive(Debug, Clone, PartialEq)]
pub enum MockRequest {
    /// `GET /products`
    ListProducts(ProductQuery),
    /// `GET /cart`
    GetCart,
    /// `POST /cart`
    UpdateCart(CartMutation),
    /// `POST /orders`
    PlaceOrder(OrderRequest),
}

impl MockRequest {
    /// Returns the product query for `GET /products` requests.
    pub fn as_product_query(&self) -> Option<&ProductQuery> {
        match self {
            MockRequest::ListProducts(query) => Some(query),
            _ => None,
        }
    }
}

/// Mock transport for testing.
///
/// ```rust
/// # tokio_test::block_on(async {
/// use storefront::transport::{MockTransport, StoreTransport};
/// use storefront::{FilterState, Product, ProductQuery};
///
/// let mock = MockTransport::with_catalog(vec![
///     Product::new(1, "Laptop", 900.0, "laptops"),
///     Product::new(2, "Mouse", 20.0, "accessories"),
/// ]);
/// let page = mock
///     .list_products(&ProductQuery::new(FilterState::default(), 0, 20))
///     .await
///     .unwrap();
/// assert_eq!(page.products.len(), 2);
/// assert!(!page.has_more);
/// # });
/// ```
pub struct MockTransport {
    catalog: RwLock<Vec<Product>>,
    cart: RwLock<Cart>,
    failures: Mutex<VecDeque<Error>>,
    latency: RwLock<Duration>,
    requests: Mutex<Vec<MockRequest>>,
    request_count: AtomicU64,
    order_failure_rate: RwLock<f64>,
    rng: Mutex<fastrand::Rng>,
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("products", &self.catalog.read().len())
            .field("request_count", &self.request_count())
            .finish_non_exhaustive()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Creates a backend with an empty catalog.
    pub fn new() -> Self {
        Self::with_catalog(Vec::new())
    }

    /// Creates a backend serving `products`.
    pub fn with_catalog(products: Vec<Product>) -> Self {
        Self {
            catalog: RwLock::new(products),
            cart: RwLock::new(Cart::new()),
            failures: Mutex::new(VecDeque::new()),
            latency: RwLock::new(Duration::ZERO),
            requests: Mutex::new(Vec::new()),
            request_count: AtomicU64::new(0),
            order_failure_rate: RwLock::new(DEFAULT_ORDER_FAILURE_RATE),
            rng: Mutex::new(fastrand::Rng::new()),
        }
    }

    /// Seeds the order-failure generator for reproducible runs.
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        *self.rng.lock() = fastrand::Rng::with_seed(seed);
        self
    }

    /// Sets the order failure rate (clamped to `[0, 1]`).
    #[must_use]
    pub fn with_order_failure_rate(self, rate: f64) -> Self {
        self.set_order_failure_rate(rate);
        self
    }

    /// Sets the simulated latency of every request.
    #[must_use]
    pub fn with_latency(self, latency: Duration) -> Self {
        self.set_latency(latency);
        self
    }

    /// Queues `error` as the response to the next request.
    ///
    /// Queued errors are consumed in order, one per request.
    pub fn fail_next(&self, error: Error) {
        self.failures.lock().push_back(error);
    }

    /// Sets the simulated latency of every request.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.write() = latency;
    }

    /// Sets the order failure rate (clamped to `[0, 1]`).
    pub fn set_order_failure_rate(&self, rate: f64) {
        *self.order_failure_rate.write() = rate.clamp(0.0, 1.0);
    }

    /// Replaces the server-side cart.
    pub fn set_cart(&self, cart: Cart) {
        *self.cart.write() = cart;
    }

    /// Returns the server-side cart.
    pub fn cart(&self) -> Cart {
        self.cart.read().clone()
    }

    /// Adds a product to the catalog.
    pub fn add_product(&self, product: Product) {
        self.catalog.write().push(product);
    }

    /// Returns the number of requests received.
    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Returns every request received, oldest first.
    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().clone()
    }

    /// Returns the product queries received, oldest first.
    pub fn product_queries(&self) -> Vec<ProductQuery> {
        self.requests
            .lock()
            .iter()
            .filter_map(|r| r.as_product_query().cloned())
            .collect()
    }

    /// Forgets recorded requests.
    pub fn clear_requests(&self) {
        self.requests.lock().clear();
        self.request_count.store(0, Ordering::Relaxed);
    }

    /// Records the request, waits out the latency, then pops any queued failure.
    async fn receive(&self, request: MockRequest) -> Result<()> {
        tracing::debug!(?request, "mock backend request");
        self.requests.lock().push(request);
        self.request_count.fetch_add(1, Ordering::Relaxed);

        let latency = *self.latency.read();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        match self.failures.lock().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn query_catalog(&self, query: &ProductQuery) -> ProductPage {
        let filters = &query.filters;
        let cart = self.cart.read();
        let catalog = self.catalog.read();

        let searched: Vec<&Product> = catalog
            .iter()
            .filter(|p| matches_search(p, filters) && matches_category(p, filters))
            .collect();
        let max_price = searched.iter().map(|p| p.price).reduce(f64::max);

        let mut matching: Vec<Product> = searched
            .into_iter()
            .filter(|p| matches_price(p, filters))
            .cloned()
            .map(|mut p| {
                p.item_in_cart = cart.quantity_of(p.id);
                p
            })
            .collect();
        sort_products(&mut matching, filters.sort);

        let total = matching.len();
        let limit = query.limit as usize;
        let start = (query.page as usize).saturating_mul(limit).min(total);
        let end = start.saturating_add(limit).min(total);

        ProductPage {
            products: matching[start..end].to_vec(),
            total: total as u64,
            has_more: end < total,
            max_price,
        }
    }
}

fn matches_search(product: &Product, filters: &FilterState) -> bool {
    let needle = filters.search_query.trim().to_lowercase();
    needle.is_empty() || product.name.to_lowercase().contains(&needle)
}

fn matches_category(product: &Product, filters: &FilterState) -> bool {
    filters
        .category
        .as_deref()
        .is_none_or(|category| product.category == category)
}

fn matches_price(product: &Product, filters: &FilterState) -> bool {
    filters.min_price.is_none_or(|min| product.price >= min)
        && filters.max_price.is_none_or(|max| product.price <= max)
}

fn sort_products(products: &mut [Product], sort: SortKey) {
    match sort {
        SortKey::NameAsc => products.sort_by(|a, b| a.name.cmp(&b.name)),
        SortKey::NameDesc => products.sort_by(|a, b| b.name.cmp(&a.name)),
        SortKey::PriceAsc => products.sort_by(|a, b| a.price.total_cmp(&b.price)),
        SortKey::PriceDesc => products.sort_by(|a, b| b.price.total_cmp(&a.price)),
    }
}

#[async_trait::async_trait]
impl StoreTransport for MockTransport {
    async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage> {
        self.receive(MockRequest::ListProducts(query.clone()))
            .await?;
        Ok(self.query_catalog(query))
    }

    async fn get_cart(&self) -> Result<Cart> {
        self.receive(MockRequest::GetCart).await?;
        Ok(self.cart())
    }

    async fn update_cart(&self, mutation: CartMutation) -> Result<Cart> {
        self.receive(MockRequest::UpdateCart(mutation)).await?;

        let product = self
            .catalog
            .read()
            .iter()
            .find(|p| p.id == mutation.product_id)
            .cloned()
            .ok_or_else(|| Error::not_found("Product not found").with_status(404))?;

        let mut cart = self.cart.write();
        if cart.line(product.id).is_none() && mutation.quantity <= 0 {
            return Err(Error::invalid_argument("Quantity must be positive").with_status(400));
        }
        cart.apply_delta(&product, mutation.quantity);
        Ok(cart.clone())
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderReceipt> {
        self.receive(MockRequest::PlaceOrder(order.clone())).await?;

        let rate = *self.order_failure_rate.read();
        if self.rng.lock().f64() < rate {
            tracing::info!(rate, "mock backend rejecting order");
            return Err(Error::internal("Order failed").with_status(500));
        }

        self.cart.write().clear();
        Ok(OrderReceipt {
            order_id: Some(uuid::Uuid::new_v4().to_string()),
            placed_at: Utc::now(),
        })
    }

    fn transport_kind(&self) -> TransportKind {
        TransportKind::Mock
    }
}
