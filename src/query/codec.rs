//! Filter state <-> URL query string.

use std::borrow::Cow;

use url::form_urlencoded;

use crate::types::{FilterState, SortKey, parse_price};

/// Query parameters owned by the filter state.
pub const FILTER_KEYS: [&str; 5] = ["q", "category", "sort", "minPrice", "maxPrice"];

impl FilterState {
    /// Encodes the filter state as a query string (no leading `?`).
    ///
    /// Empty and absent fields are omitted, as is the default sort.
    ///
    /// ```rust
    /// use storefront::{FilterState, SortKey};
    ///
    /// let filters = FilterState {
    ///     search_query: "red shoes".into(),
    ///     sort: SortKey::PriceDesc,
    ///     max_price: Some(80.0),
    ///     ..Default::default()
    /// };
    /// assert_eq!(filters.to_query(), "q=red+shoes&sort=price_desc&maxPrice=80");
    /// assert_eq!(FilterState::default().to_query(), "");
    /// ```
    pub fn to_query(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.query_pairs() {
            out.append_pair(key, &value);
        }
        out.finish()
    }

    /// Decodes a query string; a leading `?` is accepted.
    ///
    /// Unknown keys are ignored. Invalid sort values fall back to the default,
    /// invalid prices decode as absent, and blank search or category decode as empty.
    /// When a key repeats, the first occurrence wins.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut filters = FilterState::default();
        let mut seen = [false; FILTER_KEYS.len()];

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let Some(slot) = FILTER_KEYS.iter().position(|k| *k == key) else {
                continue;
            };
            if std::mem::replace(&mut seen[slot], true) {
                continue;
            }
            match slot {
                0 => filters.search_query = value.trim().to_string(),
                1 => {
                    let category = value.trim();
                    filters.category = (!category.is_empty()).then(|| category.to_string());
                }
                2 => filters.sort = value.parse::<SortKey>().unwrap_or_default(),
                3 => filters.min_price = parse_price(&value),
                _ => filters.max_price = parse_price(&value),
            }
        }
        filters
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(FILTER_KEYS.len());
        let q = self.search_query.trim();
        if !q.is_empty() {
            pairs.push(("q", q.to_string()));
        }
        if let Some(category) = self.category.as_deref().map(str::trim)
            && !category.is_empty()
        {
            pairs.push(("category", category.to_string()));
        }
        if self.sort != SortKey::default() {
            pairs.push(("sort", self.sort.as_str().to_string()));
        }
        if let Some(min) = self.min_price {
            pairs.push(("minPrice", min.to_string()));
        }
        if let Some(max) = self.max_price {
            pairs.push(("maxPrice", max.to_string()));
        }
        pairs
    }
}

/// Rewrites the filter keys of `existing` to represent `filters`.
///
/// Parameters the filter state does not own (`utm_source`, `page`, ...) are
/// kept in their original order, followed by the encoded filters.
///
/// ```rust
/// use storefront::{FilterState, query::merge_into_query};
///
/// let filters = FilterState { search_query: "lap".into(), ..Default::default() };
/// assert_eq!(
///     merge_into_query("?utm_source=mail&q=old&category=x", &filters),
///     "utm_source=mail&q=lap",
/// );
/// ```
pub fn merge_into_query(existing: &str, filters: &FilterState) -> String {
    let mut out = form_urlencoded::Serializer::new(String::new());
    for (key, value) in foreign_pairs(existing) {
        out.append_pair(&key, &value);
    }
    for (key, value) in filters.query_pairs() {
        out.append_pair(key, &value);
    }
    out.finish()
}

/// Whether two query strings carry the same filters and the same foreign
/// parameters, regardless of how either was percent-encoded.
pub fn same_query(a: &str, b: &str) -> bool {
    FilterState::from_query(a) == FilterState::from_query(b)
        && foreign_pairs(a).eq(foreign_pairs(b))
}

fn foreign_pairs(query: &str) -> impl Iterator<Item = (Cow<'_, str>, Cow<'_, str>)> {
    let query = query.strip_prefix('?').unwrap_or(query);
    form_urlencoded::parse(query.as_bytes()).filter(|(key, _)| !FILTER_KEYS.contains(&&**key))
}
