//! Filter state kept in the URL query string.
//!
//! - [`FilterState::to_query`] / [`FilterState::from_query`] and
//!   [`merge_into_query`]: the codec
//! - [`Location`] / [`MemoryLocation`]: where the query string lives
//! - [`QueryState`]: reads and partial updates against a location
//!
//! [`FilterState::to_query`]: crate::FilterState::to_query
//! [`FilterState::from_query`]: crate::FilterState::from_query

mod codec;
mod location;
mod state;

pub use codec::{FILTER_KEYS, merge_into_query, same_query};
pub use location::{HistoryMode, Location, MemoryLocation};
pub use state::{FilterWatch, QueryState};
