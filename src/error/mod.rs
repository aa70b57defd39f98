//! Error types for the storefront client.
//!
//! - [`Error`]: every fallible operation returns this, categorized by [`ErrorKind`]
//! - [`ValidationErrors`]: per-field checkout form failures
//!
//! ## Key Invariant
//!
//! A superseded request surfaces as [`ErrorKind::Cancelled`]. Callers treat it as
//! expected control flow: the feed swallows it and never shows it to the user.

mod core;
mod kind;
mod validation;

pub use self::core::Error;
pub use kind::ErrorKind;
pub use validation::ValidationErrors;

/// A specialized `Result` type for storefront operations.
pub type Result<T> = std::result::Result<T, Error>;
