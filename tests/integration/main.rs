//! Integration tests for the storefront client.
//!
//! Scenarios run end to end through the public API: against the in-memory
//! backend with paused time, and against a wiremock server for the REST
//! transport.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test --test integration
//!
//! # With logs
//! RUST_LOG=storefront=debug cargo test --test integration -- --nocapture
//! ```

mod cart_tests;
mod catalog_tests;
mod checkout_tests;
mod common;
mod rest_tests;
