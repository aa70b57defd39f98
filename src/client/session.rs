//! A catalog page: URL filters, debounced inputs, feed and cart, wired together.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::{sync::watch, task::JoinHandle};

use crate::{
    Debouncer,
    cart::{CartController, MutationOutcome},
    config::FeedConfig,
    error::Result,
    feed::{FeedSnapshot, FetchOutcome, PendingFetch, ProductFeed},
    query::{Location, QueryState},
    transport::StoreTransport,
    types::{FilterPatch, FilterState, Product, SortKey},
    viewport::{IntersectionObserver, PaginationDriver},
};

type PriceRange = (Option<f64>, Option<f64>);

/// Fetches spawned on behalf of a session.
#[derive(Default)]
struct FetchTasks {
    handles: Mutex<Vec<JoinHandle<FetchOutcome>>>,
}

impl FetchTasks {
    fn spawn(&self, fetch: PendingFetch) {
        let handle = tokio::spawn(fetch.run());
        let mut handles = self.handles.lock();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    fn abort_all(&self) {
        for handle in self.handles.lock().drain(..) {
            handle.abort();
        }
    }
}

/// A debounced input whose settled value is written to the URL.
///
/// `written` is the value this session last put in the URL. A navigation is
/// adopted into the input box only when the URL holds something else, so a
/// settled value still on its way to the URL is never overwritten.
struct UrlInput<T> {
    debouncer: Debouncer<T>,
    written: Mutex<T>,
}

impl<T> UrlInput<T>
where
    T: Clone + PartialEq + Send + Sync + std::fmt::Debug + 'static,
{
    fn new(initial: T, delay: std::time::Duration) -> Self {
        Self {
            debouncer: Debouncer::new(initial.clone(), delay),
            written: Mutex::new(initial),
        }
    }

    /// Writes `value` through `write` and records it as ours.
    fn write_settled(&self, value: T, write: impl FnOnce(&T)) {
        let mut written = self.written.lock();
        write(&value);
        *written = value;
    }

    /// Adopts the value currently in the URL unless this session wrote it.
    ///
    /// `read` runs under the same lock as [`write_settled`](Self::write_settled).
    fn follow(&self, read: impl FnOnce() -> T) -> bool {
        let mut written = self.written.lock();
        let current = read();
        if *written == current {
            return false;
        }
        *written = current.clone();
        self.debouncer.reset(current);
        true
    }
}

/// One open catalog page.
///
/// The location's query string is the source of truth for the filters.
/// Search text and price bounds pass through debouncers before they are
/// written there; category and sort are written immediately. Every distinct
/// filter set read back from the location resets the feed, and every cart
/// change is mirrored into the feed's items.
///
/// Background work runs on spawned tasks that are aborted when the session is
/// dropped, so a session must be created within a Tokio runtime.
///
/// ```rust
/// # #[tokio::main(flavor = "current_thread", start_paused = true)]
/// # async fn main() {
/// use std::sync::Arc;
/// use storefront::query::{Location, MemoryLocation};
/// use storefront::testing::sample_catalog;
/// use storefront::transport::MockTransport;
/// use storefront::Storefront;
///
/// let store = Storefront::builder()
///     .transport(Arc::new(MockTransport::with_catalog(sample_catalog())))
///     .build()
///     .unwrap();
/// let location = Arc::new(MemoryLocation::new(""));
/// let session = store.catalog(location.clone());
///
/// session.type_search("lap");
/// tokio::time::sleep(std::time::Duration::from_millis(500)).await;
/// assert_eq!(location.query(), "q=lap");
/// # }
/// ```
pub struct CatalogSession {
    query: QueryState,
    feed: ProductFeed,
    cart: CartController,
    search: Arc<UrlInput<String>>,
    price: Arc<UrlInput<PriceRange>>,
    tasks: Vec<JoinHandle<()>>,
    fetches: Arc<FetchTasks>,
}

impl std::fmt::Debug for CatalogSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogSession")
            .field("query", &self.query)
            .field("feed", &self.feed)
            .field("search", &self.search.debouncer)
            .finish_non_exhaustive()
    }
}

impl CatalogSession {
    pub(crate) fn new(
        transport: Arc<dyn StoreTransport>,
        cart: CartController,
        location: Arc<dyn Location>,
        config: &FeedConfig,
    ) -> Self {
        let query = QueryState::new(location).with_history_mode(config.history_mode);
        let feed = ProductFeed::new(transport, config);
        let fetches = Arc::new(FetchTasks::default());

        // Subscribe before the first read so no navigation slips between them.
        let mut filters = query.watch();
        let initial = filters.current().clone();

        let search = Arc::new(UrlInput::new(
            initial.search_query.clone(),
            config.search_debounce,
        ));
        let price = Arc::new(UrlInput::new(
            (initial.min_price, initial.max_price),
            config.price_debounce,
        ));

        feed.apply_cart(&cart.view());
        tracing::debug!(query = %query.location().query(), "catalog session opened");
        fetches.spawn(feed.reset(initial));

        let mut tasks = Vec::with_capacity(4);

        let mut settled_search = search.debouncer.subscribe();
        let (writer, input) = (query.clone(), Arc::clone(&search));
        tasks.push(tokio::spawn(async move {
            while settled_search.changed().await.is_ok() {
                let text = settled_search.borrow_and_update().trim().to_string();
                input.write_settled(text, |text| {
                    writer.update(&FilterPatch::new().search(text.clone()));
                });
            }
        }));

        let mut settled_price = price.debouncer.subscribe();
        let (writer, input) = (query.clone(), Arc::clone(&price));
        tasks.push(tokio::spawn(async move {
            while settled_price.changed().await.is_ok() {
                let range = *settled_price.borrow_and_update();
                input.write_settled(range, |&(min, max)| {
                    writer.update(&FilterPatch::new().price_range(min, max));
                });
            }
        }));

        let (reader, location, search_input, price_input, fetch_tasks) = (
            feed.clone(),
            query.clone(),
            Arc::clone(&search),
            Arc::clone(&price),
            Arc::clone(&fetches),
        );
        tasks.push(tokio::spawn(async move {
            while let Some(next) = filters.changed().await {
                // Navigation from outside this session wins over the input boxes.
                search_input.follow(|| location.filters().search_query);
                price_input.follow(|| {
                    let current = location.filters();
                    (current.min_price, current.max_price)
                });
                tracing::debug!(filters = ?next, "filters changed; resetting feed");
                fetch_tasks.spawn(reader.reset(next));
            }
        }));

        let mut views = cart.subscribe();
        let mirror = feed.clone();
        tasks.push(tokio::spawn(async move {
            while views.changed().await.is_ok() {
                let view = views.borrow_and_update().clone();
                mirror.apply_cart(&view);
            }
        }));

        Self {
            query,
            feed,
            cart,
            search,
            price,
            tasks,
            fetches,
        }
    }

    // ========================================================================
    // Filter inputs
    // ========================================================================

    /// Records a search keystroke; the URL follows after the debounce window.
    pub fn type_search(&self, text: impl Into<String>) {
        self.search.debouncer.set(text.into());
    }

    /// The search box contents, including unsettled keystrokes.
    pub fn search_input(&self) -> String {
        self.search.debouncer.input()
    }

    /// Moves the price sliders; the URL follows after the debounce window.
    ///
    /// `None` removes a bound.
    pub fn set_price_range(&self, min: Option<f64>, max: Option<f64>) {
        self.price.debouncer.set((min, max));
    }

    /// The price sliders' positions, including unsettled moves.
    pub fn price_input(&self) -> PriceRange {
        self.price.debouncer.input()
    }

    /// Selects a category, or all categories for `None`. Applied immediately.
    pub fn set_category(&self, category: Option<String>) -> bool {
        let patch = match category {
            Some(category) => FilterPatch::new().category(category),
            None => FilterPatch::new().clear_category(),
        };
        self.query.update(&patch)
    }

    /// Changes the sort order. Applied immediately.
    pub fn set_sort(&self, sort: SortKey) -> bool {
        self.query.update(&FilterPatch::new().sort(sort))
    }

    /// Drops every filter, including unsettled input.
    pub fn clear_filters(&self) -> bool {
        self.search.debouncer.reset(String::new());
        self.price.debouncer.reset((None, None));
        self.query.clear()
    }

    /// Filters currently in the URL.
    pub fn filters(&self) -> FilterState {
        self.query.filters()
    }

    /// The URL-backed filter state.
    pub fn query(&self) -> &QueryState {
        &self.query
    }

    // ========================================================================
    // Feed
    // ========================================================================

    /// The product feed.
    pub fn feed(&self) -> &ProductFeed {
        &self.feed
    }

    /// Current feed state.
    pub fn snapshot(&self) -> FeedSnapshot {
        self.feed.snapshot()
    }

    /// Subscribes to feed state changes.
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.feed.subscribe()
    }

    /// Starts loading the next page in the background.
    ///
    /// Returns `false` if no page may be loaded right now.
    pub fn load_more(&self) -> bool {
        match self.feed.begin_load_more() {
            Some(fetch) => {
                self.fetches.spawn(fetch);
                true
            }
            None => false,
        }
    }

    /// Re-issues the failed page in the background.
    pub fn retry(&self) -> bool {
        match self.feed.retry() {
            Some(fetch) => {
                self.fetches.spawn(fetch);
                true
            }
            None => false,
        }
    }

    /// A driver that loads the next page whenever its sentinel becomes visible.
    pub fn pagination_driver(&self, observer: Arc<dyn IntersectionObserver>) -> PaginationDriver {
        let enabled = self.feed.clone();
        let trigger = self.feed.clone();
        let fetches = Arc::clone(&self.fetches);
        PaginationDriver::new(
            observer,
            move || enabled.snapshot().can_load_more(),
            move || {
                if let Some(fetch) = trigger.begin_load_more() {
                    fetches.spawn(fetch);
                }
            },
        )
    }

    // ========================================================================
    // Cart
    // ========================================================================

    /// Changes a product's cart quantity from the product grid.
    ///
    /// The feed reflects the pending state at once and the outcome when the
    /// mutation settles.
    pub async fn add_to_cart(&self, product: &Product, delta: i32) -> Result<MutationOutcome> {
        let outcome = self.cart.update_quantity(product, delta).await;
        self.feed.apply_cart(&self.cart.view());
        outcome
    }

    /// The shared cart.
    pub fn cart(&self) -> &CartController {
        &self.cart
    }
}

impl Drop for CatalogSession {
    fn drop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.fetches.abort_all();
    }
}
