//! Paginated, filterable product feed.
//!
//! [`ProductFeed`] owns the accumulated item list and its pagination cursor.
//! Filter changes call [`ProductFeed::reset`]; the viewport driver calls
//! [`ProductFeed::begin_load_more`]. Both return a [`PendingFetch`] to run.

mod fetcher;
mod snapshot;

pub use fetcher::{PendingFetch, ProductFeed};
pub use snapshot::{FeedSnapshot, FeedStatus, FetchOutcome, PageCursor};
