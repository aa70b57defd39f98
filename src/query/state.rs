//! URL-backed filter state.

use std::sync::Arc;

use tokio::sync::watch;

use super::codec::{merge_into_query, same_query};
use super::location::{HistoryMode, Location};
use crate::types::{FilterPatch, FilterState};

/// Filter state stored in a [`Location`]'s query string.
///
/// The location is the single source of truth: every read parses the current
/// query string, so back/forward navigation and shared links are reflected
/// without any synchronization step.
///
/// ```rust
/// use std::sync::Arc;
/// use storefront::query::{Location, MemoryLocation, QueryState};
/// use storefront::{FilterPatch, SortKey};
///
/// let location = Arc::new(MemoryLocation::new("utm_source=mail"));
/// let state = QueryState::new(location.clone());
///
/// state.update(&FilterPatch::new().search("lap").sort(SortKey::NameAsc));
/// assert_eq!(location.query(), "utm_source=mail&q=lap&sort=name_asc");
///
/// state.clear();
/// assert_eq!(location.query(), "utm_source=mail");
/// ```
#[derive(Clone)]
pub struct QueryState {
    location: Arc<dyn Location>,
    mode: HistoryMode,
}

impl std::fmt::Debug for QueryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryState")
            .field("query", &self.location.query())
            .field("mode", &self.mode)
            .finish()
    }
}

impl QueryState {
    /// Creates a synchronizer over `location` that replaces history entries.
    pub fn new(location: Arc<dyn Location>) -> Self {
        Self {
            location,
            mode: HistoryMode::default(),
        }
    }

    /// Sets how [`update`](Self::update) and [`clear`](Self::clear) record history.
    #[must_use]
    pub fn with_history_mode(mut self, mode: HistoryMode) -> Self {
        self.mode = mode;
        self
    }

    /// The configured history mode.
    pub fn history_mode(&self) -> HistoryMode {
        self.mode
    }

    /// The underlying location.
    pub fn location(&self) -> &Arc<dyn Location> {
        &self.location
    }

    /// Current filters, decoded from the location.
    pub fn filters(&self) -> FilterState {
        FilterState::from_query(&self.location.query())
    }

    /// Merges `patch` into the current filters and writes the result.
    ///
    /// Returns `false` if the query string did not change; nothing is written then.
    pub fn update(&self, patch: &FilterPatch) -> bool {
        self.update_with(patch, self.mode)
    }

    /// Like [`update`](Self::update) with an explicit history mode.
    pub fn update_with(&self, patch: &FilterPatch, mode: HistoryMode) -> bool {
        let next = self.filters().merged(patch);
        self.write(&next, mode)
    }

    /// Resets to the default filters, removing every filter parameter.
    pub fn clear(&self) -> bool {
        self.write(&FilterState::default(), self.mode)
    }

    /// Writes `filters` as a whole, replacing whatever was there.
    pub fn set(&self, filters: &FilterState, mode: HistoryMode) -> bool {
        self.write(&filters.clone().normalized(), mode)
    }

    /// Watches the decoded filters.
    pub fn watch(&self) -> FilterWatch {
        let rx = self.location.subscribe();
        let last = FilterState::from_query(&rx.borrow());
        FilterWatch { rx, last }
    }

    fn write(&self, filters: &FilterState, mode: HistoryMode) -> bool {
        let current = self.location.query();
        let next = merge_into_query(&current, filters);
        if same_query(&current, &next) {
            return false;
        }
        tracing::debug!(from = %current, to = %next, ?mode, "rewriting filter query");
        self.location.navigate(&next, mode);
        true
    }
}

/// Stream of distinct filter states decoded from a location.
///
/// Changes that only touch foreign parameters are skipped.
#[derive(Debug)]
pub struct FilterWatch {
    rx: watch::Receiver<String>,
    last: FilterState,
}

impl FilterWatch {
    /// The most recently observed filters.
    pub fn current(&self) -> &FilterState {
        &self.last
    }

    /// Waits for the filters to change.
    ///
    /// Returns `None` once the location is gone.
    pub async fn changed(&mut self) -> Option<FilterState> {
        loop {
            self.rx.changed().await.ok()?;
            let next = FilterState::from_query(&self.rx.borrow_and_update());
            if next != self.last {
                self.last = next.clone();
                return Some(next);
            }
        }
    }
}
