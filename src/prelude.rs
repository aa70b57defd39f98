//! Prelude module for convenient imports.
//!
//! ```rust
//! use storefront::prelude::*;
//! ```
//!
//! This provides access to:
//! - The storefront client and catalog sessions
//! - Error types
//! - Feed, query, cart and checkout types
//! - Common data types

pub use crate::{
    cart::{CartController, CartNotice, CartView, MutationOutcome},
    checkout::{CheckoutStep, CheckoutWizard, KeyValueStore, MemoryStore, PaymentDetails},
    client::{CatalogSession, Storefront, StorefrontBuilder},
    config::{FeedConfig, RetryConfig},
    debounce::Debouncer,
    error::{Error, ErrorKind, Result, ValidationErrors},
    feed::{FeedSnapshot, FeedStatus, FetchOutcome, ProductFeed},
    query::{HistoryMode, Location, MemoryLocation, QueryState},
    transport::{MockTransport, StoreTransport, TransportKind},
    types::{
        Cart, CartLine, FilterPatch, FilterState, OrderReceipt, PaymentMethod, Product,
        ProductQuery, ShippingDetails, SortKey,
    },
    viewport::{IntersectionObserver, PaginationDriver},
};
