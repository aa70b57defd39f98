//! Catalog products and paged product queries.

use serde::{Deserialize, Serialize};

use super::filter::{FilterState, SortKey};

/// Product identifier as issued by the backend.
pub type ProductId = u64;

/// A catalog product as listed by `GET /products`.
///
/// `item_in_cart` mirrors the shopper's cart and `loading` is true exactly while a
/// cart mutation for this product is outstanding. Both are owned by the feed and
/// cart controller; presentation code only reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique product id.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Image location.
    #[serde(default)]
    pub image_url: String,
    /// Unit price, never negative.
    pub price: f64,
    /// Category slug.
    #[serde(default)]
    pub category: String,
    /// Quantity of this product currently in the cart.
    #[serde(default)]
    pub item_in_cart: u32,
    /// Transient flag: a cart mutation for this product is in flight.
    #[serde(default, skip_serializing)]
    pub loading: bool,
}

impl Product {
    /// Creates a product with no cart state.
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        price: f64,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            image_url: String::new(),
            price,
            category: category.into(),
            item_in_cart: 0,
            loading: false,
        }
    }

    /// Sets the image location.
    #[must_use]
    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = url.into();
        self
    }
}

/// One page request against `GET /products`.
///
/// Built from a [`FilterState`] plus a page cursor. Empty or absent fields are
/// left out of the query string entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductQuery {
    /// Zero-based page index.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Filters in effect.
    pub filters: FilterState,
}

impl ProductQuery {
    /// Creates a query for `page` of `filters`.
    pub fn new(filters: FilterState, page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            filters,
        }
    }

    /// Query-string pairs in wire order, omitting empty values.
    ///
    /// ```rust
    /// use storefront::{FilterState, ProductQuery};
    ///
    /// let filters = FilterState { search_query: "lap".into(), ..Default::default() };
    /// let pairs = ProductQuery::new(filters, 0, 20).to_pairs();
    /// assert_eq!(pairs[0], ("page", "0".to_string()));
    /// assert_eq!(pairs[1], ("limit", "20".to_string()));
    /// assert_eq!(pairs[2], ("q", "lap".to_string()));
    /// ```
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let f = &self.filters;
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        let q = f.search_query.trim();
        if !q.is_empty() {
            pairs.push(("q", q.to_string()));
        }
        if let Some(category) = f.category.as_deref().filter(|c| !c.is_empty()) {
            pairs.push(("category", category.to_string()));
        }
        pairs.push(("sortBy", f.sort.field().to_string()));
        pairs.push(("sortOrder", f.sort.order().to_string()));
        if let Some(min) = f.min_price {
            pairs.push(("minPrice", min.to_string()));
        }
        if let Some(max) = f.max_price {
            pairs.push(("maxPrice", max.to_string()));
        }
        pairs
    }

    /// Rebuilds a query from decoded query-string pairs, as a backend would.
    ///
    /// Unknown keys are ignored; missing page/limit fall back to `0` and `default_limit`.
    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
        default_limit: u32,
    ) -> Self {
        let mut query = ProductQuery::new(FilterState::default(), 0, default_limit);
        let mut sort_by = None;
        let mut sort_order = None;
        for (key, value) in pairs {
            match key {
                "page" => query.page = value.parse().unwrap_or(0),
                "limit" => query.limit = value.parse().unwrap_or(default_limit),
                "q" => query.filters.search_query = value.to_string(),
                "category" if !value.is_empty() => {
                    query.filters.category = Some(value.to_string())
                }
                "sortBy" => sort_by = Some(value),
                "sortOrder" => sort_order = Some(value),
                "minPrice" => query.filters.min_price = super::filter::parse_price(value),
                "maxPrice" => query.filters.max_price = super::filter::parse_price(value),
                _ => {}
            }
        }
        if let (Some(by), Some(order)) = (sort_by, sort_order) {
            query.filters.sort = SortKey::from_parts(by, order).unwrap_or_default();
        }
        query
    }
}

/// One page of `GET /products`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPage {
    /// Products on this page.
    pub products: Vec<Product>,
    /// Total number of products matching the filters.
    pub total: u64,
    /// Whether further pages exist.
    pub has_more: bool,
    /// Highest price among products matching search and category, for price sliders.
    pub max_price: Option<f64>,
}

/// Wire shape of `GET /products`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProductPageDto {
    pub products: Vec<Product>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub has_more: Option<bool>,
    #[serde(default)]
    pub max_price_change: Option<f64>,
}

impl ProductPageDto {
    /// Resolves optional fields. `hasMore` is only inferred from the page size when
    /// the server left it out.
    pub(crate) fn into_page(self, limit: u32) -> ProductPage {
        let received = self.products.len();
        let has_more = self
            .has_more
            .unwrap_or(received > 0 && received == limit as usize);
        ProductPage {
            total: self.total.unwrap_or(received as u64),
            has_more,
            max_price: self.max_price_change,
            products: self.products,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_deserializes_camel_case() {
        let json = r#"{"id":7,"name":"Laptop","imageUrl":"/img/7.png","price":999.5,"category":"laptops","itemInCart":2}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, 7);
        assert_eq!(product.image_url, "/img/7.png");
        assert_eq!(product.item_in_cart, 2);
        assert!(!product.loading);
    }

    #[test]
    fn test_pairs_omit_empty_fields() {
        let query = ProductQuery::new(FilterState::default(), 2, 20);
        let keys: Vec<_> = query.to_pairs().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["page", "limit", "sortBy", "sortOrder"]);
    }

    #[test]
    fn test_pairs_carry_every_filter() {
        let filters = FilterState {
            search_query: " lap ".into(),
            category: Some("laptops".into()),
            sort: SortKey::NameDesc,
            min_price: Some(10.0),
            max_price: Some(99.5),
        };
        let pairs = ProductQuery::new(filters, 1, 5).to_pairs();
        assert!(pairs.contains(&("q", "lap".to_string())));
        assert!(pairs.contains(&("category", "laptops".to_string())));
        assert!(pairs.contains(&("sortBy", "name".to_string())));
        assert!(pairs.contains(&("sortOrder", "desc".to_string())));
        assert!(pairs.contains(&("minPrice", "10".to_string())));
        assert!(pairs.contains(&("maxPrice", "99.5".to_string())));
    }

    #[test]
    fn test_from_pairs_inverts_to_pairs() {
        let filters = FilterState {
            search_query: "cam".into(),
            category: Some("cameras".into()),
            sort: SortKey::PriceDesc,
            min_price: Some(5.0),
            max_price: None,
        };
        let query = ProductQuery::new(filters, 3, 12);
        let pairs = query.to_pairs();
        let borrowed = pairs.iter().map(|(k, v)| (*k, v.as_str()));
        assert_eq!(ProductQuery::from_pairs(borrowed, 20), query);
    }

    #[test]
    fn test_explicit_has_more_wins_over_page_size() {
        let dto = ProductPageDto {
            products: vec![Product::new(1, "a", 1.0, "x"); 20],
            total: Some(20),
            has_more: Some(false),
            max_price_change: None,
        };
        assert!(!dto.into_page(20).has_more);
    }

    #[test]
    fn test_missing_has_more_is_inferred() {
        let full = ProductPageDto {
            products: vec![Product::new(1, "a", 1.0, "x"); 4],
            total: None,
            has_more: None,
            max_price_change: Some(50.0),
        };
        let page = full.into_page(4);
        assert!(page.has_more);
        assert_eq!(page.total, 4);
        assert_eq!(page.max_price, Some(50.0));

        let short = ProductPageDto {
            products: vec![Product::new(1, "a", 1.0, "x"); 3],
            total: None,
            has_more: None,
            max_price_change: None,
        };
        assert!(!short.into_page(4).has_more);
    }
}
