//! Checkout wizard: shipping, payment, review, confirmation.
//!
//! Form rules live in [`validate_shipping`] and [`validate_payment`]; form
//! contents persist through a [`KeyValueStore`] until the order is placed.

mod storage;
mod validation;
mod wizard;

pub use storage::{FileStore, KeyValueStore, MemoryStore, PAYMENT_KEY, SHIPPING_KEY};
pub use validation::{
    PaymentDetails, PersistedPayment, luhn_valid, validate_payment, validate_shipping,
};
pub use wizard::{CheckoutStep, CheckoutWizard};
