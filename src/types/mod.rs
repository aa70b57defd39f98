//! Core types for the storefront client.
//!
//! - [`Product`] / [`ProductQuery`] / [`ProductPage`]: the catalog and its paging
//! - [`FilterState`] / [`FilterPatch`] / [`SortKey`]: what the feed shows
//! - [`Cart`] / [`CartLine`] / [`CartMutation`]: the shopping cart
//! - [`OrderRequest`] / [`OrderReceipt`]: order placement

mod cart;
mod filter;
mod order;
mod product;

pub use cart::{Cart, CartLine, CartMutation};
pub use filter::{FilterPatch, FilterState, SortKey};
pub use order::{OrderItem, OrderReceipt, OrderRequest, PaymentMethod, ShippingDetails};
pub use product::{Product, ProductId, ProductPage, ProductQuery};

pub(crate) use cart::CartDto;
pub(crate) use filter::parse_price;
pub(crate) use order::OrderResponseDto;
pub(crate) use product::ProductPageDto;
