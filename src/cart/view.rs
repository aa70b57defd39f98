//! Published cart state and mutation results.

use std::collections::BTreeSet;

use crate::error::Error;
use crate::types::{Cart, ProductId};

/// What the presentation layer renders for the cart.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CartView {
    /// Local cart: authoritative after each response, speculative in between.
    pub cart: Cart,
    /// Products with a mutation in flight. Their controls should be disabled.
    pub pending: BTreeSet<ProductId>,
}

impl CartView {
    /// Returns `true` while a mutation for `product_id` is outstanding.
    pub fn is_pending(&self, product_id: ProductId) -> bool {
        self.pending.contains(&product_id)
    }

    /// Quantity of `product_id` in the local cart.
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.cart.quantity_of(product_id)
    }
}

/// Result of a cart mutation that reached the server.
#[derive(Debug, Clone)]
pub enum MutationOutcome {
    /// The server accepted the delta; carries the reconciled local cart.
    Committed(Cart),
    /// The server rejected the delta or could not be reached; the optimistic
    /// change was undone.
    RolledBack(Error),
}

impl MutationOutcome {
    /// Returns `true` if the mutation was committed.
    pub fn is_committed(&self) -> bool {
        matches!(self, MutationOutcome::Committed(_))
    }

    /// The error behind a rollback.
    pub fn error(&self) -> Option<&Error> {
        match self {
            MutationOutcome::RolledBack(err) => Some(err),
            MutationOutcome::Committed(_) => None,
        }
    }
}

/// Transient message for the shopper, e.g. a toast.
#[derive(Debug, Clone)]
pub enum CartNotice {
    /// A cart change failed and was undone.
    RolledBack {
        /// Product whose change was undone.
        product_id: ProductId,
        /// The rejected delta.
        delta: i32,
        /// Why it failed.
        error: Error,
    },
}

impl std::fmt::Display for CartNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CartNotice::RolledBack { error, .. } => {
                write!(f, "Could not update your cart: {}", error.message())
            }
        }
    }
}
