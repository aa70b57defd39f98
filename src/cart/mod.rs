//! Shopping cart with optimistic updates.

mod controller;
mod view;

pub use controller::CartController;
pub use view::{CartNotice, CartView, MutationOutcome};
