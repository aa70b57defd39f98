//! Catalog feed configuration.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::query::HistoryMode;

/// Page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Debounce window applied to search keystrokes and price sliders.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);

/// Configuration for the catalog feed and its input pipeline.
///
/// ## Example
///
/// ```rust
/// use storefront::{FeedConfig, HistoryMode};
/// use std::time::Duration;
///
/// let config = FeedConfig::builder()
///     .page_size(12)
///     .search_debounce(Duration::from_millis(250))
///     .history_mode(HistoryMode::Push)
///     .build();
/// assert_eq!(config.page_size, 12);
/// assert_eq!(config.price_debounce, Duration::from_millis(400));
/// ```
#[derive(Debug, Clone, bon::Builder)]
pub struct FeedConfig {
    /// Number of products requested per page.
    #[builder(default = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,

    /// Quiet period before a search keystroke reaches the URL.
    #[builder(default = DEFAULT_DEBOUNCE)]
    pub search_debounce: Duration,

    /// Quiet period before a price bound change reaches the URL.
    #[builder(default = DEFAULT_DEBOUNCE)]
    pub price_debounce: Duration,

    /// How filter updates are written to the navigation history.
    #[builder(default)]
    pub history_mode: HistoryMode,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl FeedConfig {
    /// Checks the configuration for values the feed cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::configuration("page_size must be at least 1"));
        }
        Ok(())
    }
}
