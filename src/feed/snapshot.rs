//! Observable feed state.

use crate::error::{Error, ErrorKind};
use crate::types::{FilterState, Product};

/// Where the feed is in its fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FeedStatus {
    /// Nothing in flight; more pages may exist.
    #[default]
    Idle,
    /// Fetching the first page of a filter set.
    LoadingInitial,
    /// Fetching a further page.
    LoadingMore,
    /// The last fetch failed; waits for an explicit retry.
    Error,
    /// No more pages for this filter set.
    Exhausted,
}

impl FeedStatus {
    /// Returns `true` while a fetch is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self, FeedStatus::LoadingInitial | FeedStatus::LoadingMore)
    }
}

impl std::fmt::Display for FeedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FeedStatus::Idle => "idle",
            FeedStatus::LoadingInitial => "loading-initial",
            FeedStatus::LoadingMore => "loading-more",
            FeedStatus::Error => "error",
            FeedStatus::Exhausted => "exhausted",
        };
        f.write_str(name)
    }
}

/// Pagination cursor: the next page to request and whether it may exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageCursor {
    /// Zero-based index of the next page.
    pub page: u32,
    /// Whether more pages are believed to exist.
    pub has_more: bool,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self {
            page: 0,
            has_more: true,
        }
    }
}

/// Everything the presentation layer needs to render the feed.
#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    /// Filters the items were fetched for.
    pub filters: FilterState,
    /// Accumulated items, in server order.
    pub items: Vec<Product>,
    /// Total matching products as last reported by the server.
    pub total: u64,
    /// Pagination cursor.
    pub cursor: PageCursor,
    /// Fetch status.
    pub status: FeedStatus,
    /// Error behind [`FeedStatus::Error`].
    pub error: Option<Error>,
    /// Highest price among products matching search and category.
    pub max_price: Option<f64>,
}

impl FeedSnapshot {
    /// Returns `true` if the viewport driver may trigger another page.
    pub fn can_load_more(&self) -> bool {
        self.cursor.has_more && !self.status.is_loading()
    }
}

/// What running a fetch did to the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page was committed.
    Loaded {
        /// Items on the page.
        received: usize,
        /// Whether further pages exist.
        has_more: bool,
    },
    /// A newer filter set took over; nothing was committed.
    Superseded,
    /// The call was a no-op (fetch in flight, or nothing more to load).
    Skipped,
    /// The fetch failed and the feed entered [`FeedStatus::Error`].
    Failed(ErrorKind),
}

impl FetchOutcome {
    /// Returns `true` if a page was committed.
    pub fn is_loaded(&self) -> bool {
        matches!(self, FetchOutcome::Loaded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_snapshot_can_load() {
        let snapshot = FeedSnapshot::default();
        assert!(snapshot.can_load_more());
        assert_eq!(snapshot.cursor, PageCursor { page: 0, has_more: true });
    }

    #[test]
    fn test_status_names() {
        assert_eq!(FeedStatus::LoadingInitial.to_string(), "loading-initial");
        assert!(FeedStatus::LoadingMore.is_loading());
        assert!(!FeedStatus::Exhausted.is_loading());
    }
}
