//! Paginated product fetcher.

use std::sync::Arc;

use futures::future::{AbortHandle, AbortRegistration, Abortable};
use parking_lot::Mutex;
use tokio::sync::watch;

use super::snapshot::{FeedSnapshot, FeedStatus, FetchOutcome, PageCursor};
use crate::cart::CartView;
use crate::config::FeedConfig;
use crate::error::Result;
use crate::transport::StoreTransport;
use crate::types::{FilterState, Product, ProductPage, ProductQuery};

// ============================================================================
// ProductFeed
// ============================================================================

/// Accumulates pages of products for the current filter set.
///
/// State changes happen synchronously under a lock: [`reset`](Self::reset)
/// and [`begin_load_more`](Self::begin_load_more) decide and record what to
/// fetch before any await point, and return a [`PendingFetch`] that performs
/// the request. Each fetch carries the generation it was issued under; a
/// result is committed only if that generation is still current, and a reset
/// aborts the in-flight request outright.
///
/// ```rust
/// # tokio_test::block_on(async {
/// use std::sync::Arc;
/// use storefront::feed::{FetchOutcome, ProductFeed};
/// use storefront::testing::sample_catalog;
/// use storefront::transport::MockTransport;
/// use storefront::{FeedConfig, FilterState};
///
/// let backend = Arc::new(MockTransport::with_catalog(sample_catalog()));
/// let feed = ProductFeed::new(backend, &FeedConfig::default());
///
/// let outcome = feed.reset(FilterState::default()).run().await;
/// assert!(outcome.is_loaded());
/// assert_eq!(feed.snapshot().items.len(), 20);
/// # });
/// ```
#[derive(Clone)]
pub struct ProductFeed {
    inner: Arc<FeedInner>,
}

struct FeedInner {
    transport: Arc<dyn StoreTransport>,
    page_size: u32,
    state: Mutex<FeedState>,
    published: watch::Sender<FeedSnapshot>,
}

#[derive(Default)]
struct FeedState {
    generation: u64,
    next_fetch_id: u64,
    in_flight: Option<InFlight>,
    /// Page that failed, for [`ProductFeed::retry`].
    failed_page: Option<u32>,
    cart: Option<CartView>,
    snapshot: FeedSnapshot,
}

struct InFlight {
    fetch_id: u64,
    abort: AbortHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchKind {
    Initial,
    More,
}

impl std::fmt::Debug for ProductFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("ProductFeed")
            .field("generation", &state.generation)
            .field("status", &state.snapshot.status)
            .field("items", &state.snapshot.items.len())
            .field("cursor", &state.snapshot.cursor)
            .finish()
    }
}

impl ProductFeed {
    /// Creates an idle, empty feed.
    pub fn new(transport: Arc<dyn StoreTransport>, config: &FeedConfig) -> Self {
        Self {
            inner: Arc::new(FeedInner {
                transport,
                page_size: config.page_size.max(1),
                state: Mutex::new(FeedState::default()),
                published: watch::channel(FeedSnapshot::default()).0,
            }),
        }
    }

    /// Starts over for `filters`.
    ///
    /// Aborts any in-flight fetch, empties the list, resets the cursor to page 0
    /// with `has_more`, enters [`FeedStatus::LoadingInitial`] and publishes, all
    /// before returning. The returned fetch loads the first page.
    pub fn reset(&self, filters: FilterState) -> PendingFetch {
        let mut state = self.inner.state.lock();
        state.generation += 1;
        if let Some(previous) = state.in_flight.take() {
            previous.abort.abort();
            tracing::debug!(fetch_id = previous.fetch_id, "superseded in-flight fetch");
        }

        let max_price = state.snapshot.max_price;
        state.snapshot = FeedSnapshot {
            filters: filters.normalized(),
            items: Vec::new(),
            total: 0,
            cursor: PageCursor::default(),
            status: FeedStatus::LoadingInitial,
            error: None,
            max_price,
        };
        state.failed_page = None;

        self.inner.issue(&mut state, FetchKind::Initial, 0)
    }

    /// Re-runs the current filter set from page 0.
    pub fn reload(&self) -> PendingFetch {
        let filters = self.inner.state.lock().snapshot.filters.clone();
        self.reset(filters)
    }

    /// Claims the next page if one may be loaded.
    ///
    /// Returns `None`, changing nothing, while a fetch is in flight, after the
    /// feed is exhausted, or after an error (see [`retry`](Self::retry)).
    pub fn begin_load_more(&self) -> Option<PendingFetch> {
        let mut state = self.inner.state.lock();
        let snapshot = &state.snapshot;
        if state.in_flight.is_some()
            || !snapshot.cursor.has_more
            || matches!(snapshot.status, FeedStatus::Error | FeedStatus::Exhausted)
        {
            tracing::trace!(status = %snapshot.status, "load more skipped");
            return None;
        }

        let page = snapshot.cursor.page;
        let kind = if page == 0 {
            FetchKind::Initial
        } else {
            FetchKind::More
        };
        state.snapshot.status = match kind {
            FetchKind::Initial => FeedStatus::LoadingInitial,
            FetchKind::More => FeedStatus::LoadingMore,
        };
        Some(self.inner.issue(&mut state, kind, page))
    }

    /// Loads the next page; [`FetchOutcome::Skipped`] if none may be loaded.
    pub async fn load_more(&self) -> FetchOutcome {
        match self.begin_load_more() {
            Some(fetch) => fetch.run().await,
            None => FetchOutcome::Skipped,
        }
    }

    /// Re-issues the page that failed, re-enabling `has_more`.
    ///
    /// Returns `None` unless the feed is in [`FeedStatus::Error`].
    pub fn retry(&self) -> Option<PendingFetch> {
        let mut state = self.inner.state.lock();
        if state.snapshot.status != FeedStatus::Error || state.in_flight.is_some() {
            return None;
        }

        let page = state.failed_page.take().unwrap_or(state.snapshot.cursor.page);
        let kind = if page == 0 {
            FetchKind::Initial
        } else {
            FetchKind::More
        };
        let snapshot = &mut state.snapshot;
        snapshot.cursor.has_more = true;
        snapshot.error = None;
        snapshot.status = match kind {
            FetchKind::Initial => FeedStatus::LoadingInitial,
            FetchKind::More => FeedStatus::LoadingMore,
        };
        tracing::debug!(page, "retrying failed page");
        Some(self.inner.issue(&mut state, kind, page))
    }

    /// Mirrors the cart into the accumulated items' `item_in_cart` and `loading`.
    ///
    /// The view is remembered and applied to pages that arrive later.
    pub fn apply_cart(&self, view: &CartView) {
        let mut state = self.inner.state.lock();
        let changed = overlay_cart(&mut state.snapshot.items, view);
        state.cart = Some(view.clone());
        if changed {
            self.inner.publish(&state);
        }
    }

    /// Current state.
    pub fn snapshot(&self) -> FeedSnapshot {
        self.inner.published.borrow().clone()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.inner.published.subscribe()
    }

    /// Current fetch status.
    pub fn status(&self) -> FeedStatus {
        self.inner.state.lock().snapshot.status
    }

    /// Current generation; bumped by every reset.
    pub fn generation(&self) -> u64 {
        self.inner.state.lock().generation
    }

    /// Configured page size.
    pub fn page_size(&self) -> u32 {
        self.inner.page_size
    }
}

impl FeedInner {
    /// Registers a new in-flight fetch and publishes the current state.
    fn issue(self: &Arc<Self>, state: &mut FeedState, kind: FetchKind, page: u32) -> PendingFetch {
        state.next_fetch_id += 1;
        let fetch_id = state.next_fetch_id;
        let (abort, registration) = AbortHandle::new_pair();
        state.in_flight = Some(InFlight { fetch_id, abort });

        let query = ProductQuery::new(state.snapshot.filters.clone(), page, self.page_size);
        tracing::debug!(
            method = "GET",
            path = "/products",
            page,
            generation = state.generation,
            fetch_id,
            "issuing product fetch"
        );
        self.publish(state);

        PendingFetch {
            inner: Arc::clone(self),
            ticket: Ticket {
                generation: state.generation,
                fetch_id,
                kind,
            },
            query,
            registration: Some(registration),
            settled: false,
        }
    }

    fn publish(&self, state: &FeedState) {
        self.published.send_replace(state.snapshot.clone());
    }

    fn is_current(state: &FeedState, ticket: &Ticket) -> bool {
        state.generation == ticket.generation
            && state
                .in_flight
                .as_ref()
                .is_some_and(|f| f.fetch_id == ticket.fetch_id)
    }

    fn commit(&self, ticket: &Ticket, page_number: u32, result: Result<ProductPage>) -> FetchOutcome {
        let mut state = self.state.lock();
        if !Self::is_current(&state, ticket) {
            return FetchOutcome::Superseded;
        }
        state.in_flight = None;

        let outcome = match result {
            Ok(page) => {
                let received = page.products.len();
                let has_more = page.has_more && received > 0;
                let mut products = page.products;
                if let Some(view) = &state.cart {
                    overlay_cart(&mut products, view);
                }

                let snapshot = &mut state.snapshot;
                match ticket.kind {
                    FetchKind::Initial => snapshot.items = products,
                    FetchKind::More => snapshot.items.extend(products),
                }
                snapshot.total = page.total;
                if page.max_price.is_some() {
                    snapshot.max_price = page.max_price;
                }
                snapshot.cursor = PageCursor {
                    page: page_number + 1,
                    has_more,
                };
                snapshot.error = None;
                snapshot.status = if has_more {
                    FeedStatus::Idle
                } else {
                    FeedStatus::Exhausted
                };
                if !has_more {
                    tracing::info!(
                        items = snapshot.items.len(),
                        total = snapshot.total,
                        "product feed exhausted"
                    );
                }
                FetchOutcome::Loaded { received, has_more }
            }
            Err(err) if err.is_cancellation() => {
                let snapshot = &mut state.snapshot;
                snapshot.status = if snapshot.cursor.has_more {
                    FeedStatus::Idle
                } else {
                    FeedStatus::Exhausted
                };
                FetchOutcome::Superseded
            }
            Err(err) => {
                tracing::warn!(page = page_number, error = %err, "product fetch failed");
                let kind = err.kind();
                state.failed_page = Some(page_number);
                let snapshot = &mut state.snapshot;
                snapshot.cursor.has_more = false;
                snapshot.status = FeedStatus::Error;
                snapshot.error = Some(err);
                FetchOutcome::Failed(kind)
            }
        };

        self.publish(&state);
        outcome
    }

    /// Releases a fetch that was dropped before completing.
    fn abandon(&self, ticket: &Ticket) {
        let mut state = self.state.lock();
        if !Self::is_current(&state, ticket) {
            return;
        }
        state.in_flight = None;
        let snapshot = &mut state.snapshot;
        if snapshot.status.is_loading() {
            snapshot.status = FeedStatus::Idle;
        }
        tracing::debug!(fetch_id = ticket.fetch_id, "fetch abandoned");
        self.publish(&state);
    }
}

fn overlay_cart(items: &mut [Product], view: &CartView) -> bool {
    let mut changed = false;
    for item in items.iter_mut() {
        let quantity = view.quantity_of(item.id);
        let loading = view.is_pending(item.id);
        if item.item_in_cart != quantity || item.loading != loading {
            item.item_in_cart = quantity;
            item.loading = loading;
            changed = true;
        }
    }
    changed
}

// ============================================================================
// PendingFetch
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Ticket {
    generation: u64,
    fetch_id: u64,
    kind: FetchKind,
}

/// A fetch the feed has committed to. Does nothing until [`run`](Self::run).
///
/// Dropping it, or the future returned by `run`, before completion releases
/// the feed's in-flight slot.
#[must_use = "a PendingFetch does nothing until run"]
pub struct PendingFetch {
    inner: Arc<FeedInner>,
    ticket: Ticket,
    query: ProductQuery,
    registration: Option<AbortRegistration>,
    settled: bool,
}

impl std::fmt::Debug for PendingFetch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingFetch")
            .field("generation", &self.ticket.generation)
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}

impl PendingFetch {
    /// The request this fetch will send.
    pub fn query(&self) -> &ProductQuery {
        &self.query
    }

    /// Generation the fetch was issued under.
    pub fn generation(&self) -> u64 {
        self.ticket.generation
    }

    /// Sends the request and commits the result if still current.
    pub async fn run(mut self) -> FetchOutcome {
        let Some(registration) = self.registration.take() else {
            return FetchOutcome::Skipped;
        };

        let transport = Arc::clone(&self.inner.transport);
        let query = self.query.clone();
        let request = async move { transport.list_products(&query).await };

        let outcome = match Abortable::new(request, registration).await {
            Ok(result) => self.inner.commit(&self.ticket, self.query.page, result),
            Err(_aborted) => FetchOutcome::Superseded,
        };
        self.settled = true;
        outcome
    }
}

impl Drop for PendingFetch {
    fn drop(&mut self) {
        if !self.settled {
            self.inner.abandon(&self.ticket);
        }
    }
}
