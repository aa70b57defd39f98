//! Filter state for the catalog feed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Sort order of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Name, A to Z.
    NameAsc,
    /// Name, Z to A.
    NameDesc,
    /// Price, lowest first.
    #[default]
    PriceAsc,
    /// Price, highest first.
    PriceDesc,
}

impl SortKey {
    /// All sort keys, in menu order.
    pub const ALL: [SortKey; 4] = [
        SortKey::NameAsc,
        SortKey::NameDesc,
        SortKey::PriceAsc,
        SortKey::PriceDesc,
    ];

    /// URL token (`price_asc`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::NameAsc => "name_asc",
            SortKey::NameDesc => "name_desc",
            SortKey::PriceAsc => "price_asc",
            SortKey::PriceDesc => "price_desc",
        }
    }

    /// Backend `sortBy` value.
    pub fn field(&self) -> &'static str {
        match self {
            SortKey::NameAsc | SortKey::NameDesc => "name",
            SortKey::PriceAsc | SortKey::PriceDesc => "price",
        }
    }

    /// Backend `sortOrder` value.
    pub fn order(&self) -> &'static str {
        match self {
            SortKey::NameAsc | SortKey::PriceAsc => "asc",
            SortKey::NameDesc | SortKey::PriceDesc => "desc",
        }
    }

    /// Rebuilds a key from backend `sortBy`/`sortOrder` values.
    pub fn from_parts(field: &str, order: &str) -> Option<Self> {
        match (field, order) {
            ("name", "asc") => Some(SortKey::NameAsc),
            ("name", "desc") => Some(SortKey::NameDesc),
            ("price", "asc") => Some(SortKey::PriceAsc),
            ("price", "desc") => Some(SortKey::PriceDesc),
            _ => None,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| Error::invalid_argument(format!("unknown sort key: {s:?}")))
    }
}

/// The filter set that determines which products the feed fetches.
///
/// The URL is the source of truth; this struct is what it decodes to. A state is
/// *normalized* when it has no representation the URL would drop: no blank
/// category, no surrounding whitespace in the search, and only finite,
/// non-negative price bounds.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterState {
    /// Free-text search.
    pub search_query: String,
    /// Category slug, if filtering by one.
    pub category: Option<String>,
    /// Sort order.
    pub sort: SortKey,
    /// Inclusive lower price bound.
    pub min_price: Option<f64>,
    /// Inclusive upper price bound.
    pub max_price: Option<f64>,
}

impl FilterState {
    /// Returns `true` if no filter narrows the catalog (sort is ignored).
    pub fn is_unfiltered(&self) -> bool {
        self.search_query.trim().is_empty()
            && self.category.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
    }

    /// Returns the equivalent state with every droppable value removed.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.search_query = self.search_query.trim().to_string();
        self.category = self
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        self.min_price = self.min_price.filter(|p| is_valid_price(*p));
        self.max_price = self.max_price.filter(|p| is_valid_price(*p));
        self
    }

    /// Applies `patch` on top of this state and normalizes the result.
    #[must_use]
    pub fn merged(mut self, patch: &FilterPatch) -> Self {
        if let Some(ref q) = patch.search_query {
            self.search_query = q.clone();
        }
        if let Some(ref category) = patch.category {
            self.category = category.clone();
        }
        if let Some(sort) = patch.sort {
            self.sort = sort;
        }
        if let Some(min) = patch.min_price {
            self.min_price = min;
        }
        if let Some(max) = patch.max_price {
            self.max_price = max;
        }
        self.normalized()
    }
}

/// A partial update to a [`FilterState`].
///
/// Each field is `None` to leave it untouched. For clearable fields the inner
/// `Option` distinguishes "set" from "clear"; empty strings also clear.
///
/// ```rust
/// use storefront::{FilterPatch, FilterState, SortKey};
///
/// let patch = FilterPatch::new().search("lap").sort(SortKey::NameAsc).clear_category();
/// let next = FilterState::default().merged(&patch);
/// assert_eq!(next.search_query, "lap");
/// assert_eq!(next.sort, SortKey::NameAsc);
/// assert_eq!(next.category, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPatch {
    /// New search text.
    pub search_query: Option<String>,
    /// New category (`Some(None)` clears).
    pub category: Option<Option<String>>,
    /// New sort order.
    pub sort: Option<SortKey>,
    /// New lower bound (`Some(None)` clears).
    pub min_price: Option<Option<f64>>,
    /// New upper bound (`Some(None)` clears).
    pub max_price: Option<Option<f64>>,
}

impl FilterPatch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the search text.
    #[must_use]
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search_query = Some(text.into());
        self
    }

    /// Sets the category.
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(Some(category.into()));
        self
    }

    /// Removes the category filter.
    #[must_use]
    pub fn clear_category(mut self) -> Self {
        self.category = Some(None);
        self
    }

    /// Sets the sort order.
    #[must_use]
    pub fn sort(mut self, sort: SortKey) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Sets or clears the lower price bound.
    #[must_use]
    pub fn min_price(mut self, min: Option<f64>) -> Self {
        self.min_price = Some(min);
        self
    }

    /// Sets or clears the upper price bound.
    #[must_use]
    pub fn max_price(mut self, max: Option<f64>) -> Self {
        self.max_price = Some(max);
        self
    }

    /// Sets or clears both price bounds.
    #[must_use]
    pub fn price_range(self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_price(min).max_price(max)
    }

    /// Returns `true` if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == FilterPatch::default()
    }
}

pub(crate) fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price >= 0.0
}

/// Parses a price bound; anything non-numeric, negative or non-finite is absent.
pub(crate) fn parse_price(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|p| is_valid_price(*p))
}
