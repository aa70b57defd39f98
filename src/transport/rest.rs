//! REST transport implementation using reqwest.
//!
//! Speaks the storefront JSON API: `GET /products`, `GET /cart`,
//! `POST /cart` and `POST /orders`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, RETRY_AFTER};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::RetryConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::transport::traits::{StoreTransport, TransportKind};
use crate::types::{
    Cart, CartDto, CartMutation, OrderReceipt, OrderRequest, OrderResponseDto, ProductPage,
    ProductPageDto, ProductQuery,
};
use crate::user_agent;

// ============================================================================
// REST Transport
// ============================================================================

/// Request counters for a [`RestTransport`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestStats {
    /// Requests that reached the network, retries included.
    pub requests_sent: u64,
    /// Requests that ended in an error.
    pub requests_failed: u64,
    /// Retry attempts made.
    pub retries: u64,
}

/// REST transport using reqwest.
#[derive(Clone)]
pub struct RestTransport {
    client: reqwest::Client,
    base_url: Url,
    retry_config: RetryConfig,
    stats: Arc<RwLock<RestStats>>,
}

impl std::fmt::Debug for RestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestTransport")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl RestTransport {
    /// Creates a new REST transport builder.
    pub fn builder() -> RestTransportBuilder {
        RestTransportBuilder::new()
    }

    /// Creates a REST transport for `base_url`.
    pub fn new(base_url: Url, retry_config: RetryConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent::user_agent())
            .build()
            .map_err(|e| {
                Error::configuration(format!("Failed to create HTTP client: {}", e)).with_source(e)
            })?;

        Ok(Self {
            client,
            base_url,
            retry_config,
            stats: Arc::new(RwLock::new(RestStats::default())),
        })
    }

    /// Returns the base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns a copy of the request counters.
    pub fn stats(&self) -> RestStats {
        *self.stats.read()
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::configuration(format!("Invalid URL path: {}", e)))
    }

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    /// Makes an idempotent GET, retrying transient failures per [`RetryConfig`].
    async fn get<R>(&self, path: &str, query: &[(&'static str, String)]) -> Result<R>
    where
        R: DeserializeOwned + Default,
    {
        let url = self.url(path)?;
        let mut attempt = 0;

        loop {
            tracing::debug!(method = "GET", path, attempt, "storefront request");
            let result = self
                .execute(
                    self.client
                        .get(url.clone())
                        .headers(Self::headers())
                        .query(query),
                )
                .await;

            match result {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let Some(delay) = self.retry_config.next_delay(attempt + 1, &err) else {
                        return Err(err);
                    };
                    attempt += 1;
                    self.stats.write().retries += 1;
                    tracing::debug!(path, attempt, ?delay, error = %err, "retrying request");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Makes a single-attempt POST with a JSON body.
    async fn post<T, R>(&self, path: &str, body: &T) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned + Default,
    {
        let url = self.url(path)?;
        tracing::debug!(method = "POST", path, "storefront request");
        self.execute(
            self.client
                .post(url)
                .headers(Self::headers())
                .json(body),
        )
        .await
    }

    /// Sends one request and decodes the JSON body.
    ///
    /// An empty success body decodes as `R::default()`.
    async fn execute<R>(&self, request: reqwest::RequestBuilder) -> Result<R>
    where
        R: DeserializeOwned + Default,
    {
        self.stats.write().requests_sent += 1;

        let outcome = async {
            let response = request.send().await.map_err(map_reqwest_error)?;
            let status = response.status();

            if !status.is_success() {
                let retry_after = parse_retry_after(response.headers());
                let body = response.text().await.unwrap_or_default();
                let mut err = map_status_error(status.as_u16(), &body);
                if let Some(delay) = retry_after {
                    err = err.with_retry_after(delay);
                }
                return Err(err);
            }

            let bytes = response.bytes().await.map_err(map_reqwest_error)?;
            if bytes.iter().all(u8::is_ascii_whitespace) {
                return Ok(R::default());
            }
            serde_json::from_slice::<R>(&bytes).map_err(|e| {
                Error::invalid_response(format!("Failed to parse response: {}", e)).with_source(e)
            })
        }
        .await;

        if outcome.is_err() {
            self.stats.write().requests_failed += 1;
        }
        outcome
    }
}

// ============================================================================
// REST Transport Builder
// ============================================================================

/// Builder for [`RestTransport`].
pub struct RestTransportBuilder {
    base_url: Option<Url>,
    retry_config: RetryConfig,
    timeout: Duration,
}

impl RestTransportBuilder {
    fn new() -> Self {
        Self {
            base_url: None,
            retry_config: RetryConfig::default(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the API base URL (e.g. `http://localhost:3001/api/`).
    ///
    /// A trailing slash is added when missing so relative paths resolve below it.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        let raw = url.as_ref();
        let normalized = if raw.ends_with('/') {
            raw.to_string()
        } else {
            format!("{raw}/")
        };
        self.base_url = Some(Url::parse(&normalized)?);
        Ok(self)
    }

    /// Sets the retry configuration for idempotent requests.
    #[must_use]
    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the REST transport.
    pub fn build(self) -> Result<RestTransport> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::configuration("Base URL is required"))?;
        RestTransport::new(base_url, self.retry_config, self.timeout)
    }
}

// ============================================================================
// StoreTransport Implementation
// ============================================================================

#[async_trait::async_trait]
impl StoreTransport for RestTransport {
    async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage> {
        let dto: ProductPageWire = self.get("products", &query.to_pairs()).await?;
        let dto = dto
            .0
            .ok_or_else(|| Error::invalid_response("empty product page body"))?;
        Ok(dto.into_page(query.limit))
    }

    async fn get_cart(&self) -> Result<Cart> {
        let dto: CartWire = self.get("cart", &[]).await?;
        Ok(dto.0.map(CartDto::into_cart).unwrap_or_default())
    }

    async fn update_cart(&self, mutation: CartMutation) -> Result<Cart> {
        let dto: CartWire = self.post("cart", &mutation).await?;
        dto.0
            .map(CartDto::into_cart)
            .ok_or_else(|| Error::invalid_response("cart update returned no snapshot"))
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderReceipt> {
        let dto: OrderResponseDto = self.post("orders", order).await?;
        tracing::info!(order_id = ?dto.order_id, "order accepted");
        Ok(OrderReceipt {
            order_id: dto.order_id,
            placed_at: Utc::now(),
        })
    }

    fn transport_kind(&self) -> TransportKind {
        TransportKind::Http
    }
}

/// Product page body; `None` when the server sent no body at all.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(transparent)]
struct ProductPageWire(Option<ProductPageDto>);

/// Cart body; `None` when the server sent no body at all.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(transparent)]
struct CartWire(Option<CartDto>);

// ============================================================================
// Error Mapping
// ============================================================================

/// Maps reqwest transport errors to storefront errors.
fn map_reqwest_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::timeout(format!("Request timed out: {}", e)).with_source(e)
    } else if e.is_connect() {
        Error::connection(format!("Connection failed: {}", e)).with_source(e)
    } else if e.is_decode() {
        Error::invalid_response(format!("Failed to read response: {}", e)).with_source(e)
    } else if e.is_request() {
        Error::new(ErrorKind::Transport, format!("Invalid request: {}", e)).with_source(e)
    } else {
        Error::new(ErrorKind::Transport, format!("HTTP error: {}", e)).with_source(e)
    }
}

/// Maps HTTP status codes to storefront errors.
///
/// JSON bodies of the form `{"error": "..."}` or `{"message": "..."}` provide the message.
fn map_status_error(status: u16, body: &str) -> Error {
    let message = if body.trim().is_empty() {
        format!("HTTP {}", status)
    } else if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        value
            .get("error")
            .or_else(|| value.get("message"))
            .and_then(|m| m.as_str())
            .unwrap_or(body)
            .to_string()
    } else {
        body.to_string()
    };

    Error::new(ErrorKind::from_http_status(status), message).with_status(status)
}

/// Reads a `Retry-After` header given in whole seconds.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

// ============================================================================
// Tests
// ============================================================================


// Wiremock-based async tests
#[cfg(test)]
mod wiremock_tests {
    use super::*;
    use crate::types::FilterState;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_test_transport(server: &MockServer) -> RestTransport {
        RestTransport::builder()
            .base_url(server.uri())
            .unwrap()
            .retry_config(
                RetryConfig::new()
                    .with_max_retries(2)
                    .with_initial_delay(Duration::from_millis(1))
                    .with_jitter(0.0),
            )
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_products_sends_query_pairs() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/products"))
            .and(query_param("q", "lap"))
            .and(query_param("page", "0"))
            .and(query_param("limit", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "products": [{"id": 1, "name": "Laptop", "price": 900, "category": "laptops"}],
                "total": 1,
                "hasMore": false,
                "maxPriceChange": 900
            })))
            .expect(1)
            .mount(&server)
            .await;

        let transport = create_test_transport(&server).await;
        let filters = FilterState {
            search_query: "lap".into(),
            ..Default::default()
        };
        let page = transport
            .list_products(&ProductQuery::new(filters, 0, 20))
            .await
            .unwrap();
        assert_eq!(page.products.len(), 1);
        assert!(!page.has_more);
        assert_eq!(page.max_price, Some(900.0));
    }

    #[tokio::test]
    async fn test_get_retries_server_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/cart"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [], "totalPrice": 0, "totalItems": 0
            })))
            .mount(&server)
            .await;

        let transport = create_test_transport(&server).await;
        let cart = transport.get_cart().await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(transport.stats().retries, 1);
    }

    #[tokio::test]
    async fn test_update_cart_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/cart"))
            .and(body_json(serde_json::json!({"productId": 7, "quantity": 1})))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let transport = create_test_transport(&server).await;
        let err = transport
            .update_cart(CartMutation {
                product_id: 7,
                quantity: 1,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert_eq!(transport.stats().retries, 0);
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_response() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/products"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"items\": 3}"))
            .mount(&server)
            .await;

        let transport = create_test_transport(&server).await;
        let err = transport
            .list_products(&ProductQuery::new(FilterState::default(), 0, 20))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
        assert_eq!(transport.stats().requests_failed, 1);
    }

    #[tokio::test]
    async fn test_place_order_accepts_empty_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/orders"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let transport = create_test_transport(&server).await;
        let order = OrderRequest::from_cart(
            &Cart::new(),
            Default::default(),
            Default::default(),
            None,
        );
        let receipt = transport.place_order(&order).await.unwrap();
        assert_eq!(receipt.order_id, None);
    }
}
