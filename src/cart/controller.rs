//! Optimistic cart mutations.

use std::{collections::BTreeSet, sync::Arc};

use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};

use super::view::{CartNotice, CartView, MutationOutcome};
use crate::error::{Error, Result};
use crate::transport::StoreTransport;
use crate::types::{Cart, CartMutation, Product, ProductId};

const NOTICE_CAPACITY: usize = 16;

/// Owns the local cart and applies changes optimistically.
///
/// A mutation updates the local cart and marks the product pending before the
/// request leaves, then either adopts the server's snapshot or undoes the
/// change. Cloning is cheap and clones share the same cart.
///
/// ```rust
/// # tokio_test::block_on(async {
/// use std::sync::Arc;
/// use storefront::cart::CartController;
/// use storefront::transport::MockTransport;
/// use storefront::Product;
///
/// let laptop = Product::new(7, "Laptop", 900.0, "laptops");
/// let backend = Arc::new(MockTransport::with_catalog(vec![laptop.clone()]));
/// let cart = CartController::new(backend);
///
/// let outcome = cart.add(&laptop).await.unwrap();
/// assert!(outcome.is_committed());
/// assert_eq!(cart.view().quantity_of(7), 1);
/// # });
/// ```
#[derive(Clone)]
pub struct CartController {
    inner: Arc<CartInner>,
}

struct CartInner {
    transport: Arc<dyn StoreTransport>,
    state: Mutex<CartState>,
    view: watch::Sender<CartView>,
    notices: broadcast::Sender<CartNotice>,
}

#[derive(Default)]
struct CartState {
    cart: Cart,
    pending: BTreeSet<ProductId>,
    /// Bumped on every local change to the cart.
    version: u64,
}

impl std::fmt::Debug for CartController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("CartController")
            .field("total_items", &state.cart.total_items())
            .field("pending", &state.pending)
            .field("version", &state.version)
            .finish()
    }
}

impl CartController {
    /// Creates a controller with an empty local cart.
    pub fn new(transport: Arc<dyn StoreTransport>) -> Self {
        Self {
            inner: Arc::new(CartInner {
                transport,
                state: Mutex::new(CartState::default()),
                view: watch::channel(CartView::default()).0,
                notices: broadcast::channel(NOTICE_CAPACITY).0,
            }),
        }
    }

    /// Fetches the authoritative cart and adopts it.
    ///
    /// Lines with a mutation in flight keep their local value.
    pub async fn load(&self) -> Result<Cart> {
        let server = self.inner.transport.get_cart().await?;
        let mut state = self.inner.state.lock();
        let merged = self.inner.adopt(&mut state, server, None);
        Ok(merged)
    }

    /// Adds one unit of `product`.
    pub async fn add(&self, product: &Product) -> Result<MutationOutcome> {
        self.update_quantity(product, 1).await
    }

    /// Removes one unit of `product`.
    pub async fn remove_one(&self, product: &Product) -> Result<MutationOutcome> {
        self.update_quantity(product, -1).await
    }

    /// Removes the whole line for `product`.
    pub async fn remove_line(&self, product: &Product) -> Result<MutationOutcome> {
        let quantity = self.inner.state.lock().cart.quantity_of(product.id);
        if quantity == 0 {
            return Err(Error::invalid_argument(format!(
                "product {} is not in the cart",
                product.id
            )));
        }
        let delta = i32::try_from(quantity).unwrap_or(i32::MAX);
        self.update_quantity(product, -delta).await
    }

    /// Applies `delta` to `product`'s line locally, then sends it to the server.
    ///
    /// # Errors
    ///
    /// Returns `Busy` without touching anything if a mutation for the same
    /// product is still in flight, and `InvalidArgument` for a zero delta or a
    /// negative delta on a product that is not in the cart. Server and network
    /// failures are not errors here: they come back as
    /// [`MutationOutcome::RolledBack`].
    pub async fn update_quantity(&self, product: &Product, delta: i32) -> Result<MutationOutcome> {
        let guard = self.begin(product, delta)?;
        let mutation = CartMutation {
            product_id: product.id,
            quantity: delta,
        };

        tracing::debug!(product_id = product.id, delta, "sending cart mutation");
        let result = self.inner.transport.update_cart(mutation).await;
        Ok(guard.finish(result))
    }

    /// Current view.
    pub fn view(&self) -> CartView {
        self.inner.view.borrow().clone()
    }

    /// Current local cart.
    pub fn cart(&self) -> Cart {
        self.inner.state.lock().cart.clone()
    }

    /// Returns `true` while a mutation for `product_id` is outstanding.
    pub fn is_pending(&self, product_id: ProductId) -> bool {
        self.inner.state.lock().pending.contains(&product_id)
    }

    /// Subscribes to view changes.
    pub fn subscribe(&self) -> watch::Receiver<CartView> {
        self.inner.view.subscribe()
    }

    /// Subscribes to transient notices.
    pub fn notices(&self) -> broadcast::Receiver<CartNotice> {
        self.inner.notices.subscribe()
    }

    /// Empties the local cart, e.g. after the server cleared it on checkout.
    pub fn clear_local(&self) {
        let mut state = self.inner.state.lock();
        state.cart.clear();
        state.version += 1;
        self.inner.publish(&state);
    }

    /// Validates and applies the optimistic change in one critical section,
    /// capturing the pre-change cart in the same step.
    fn begin(&self, product: &Product, delta: i32) -> Result<MutationGuard> {
        if delta == 0 {
            return Err(Error::invalid_argument("quantity delta must not be zero"));
        }

        let mut state = self.inner.state.lock();
        if state.pending.contains(&product.id) {
            return Err(Error::busy(product.id));
        }
        if delta < 0 && state.cart.line(product.id).is_none() {
            return Err(Error::invalid_argument(format!(
                "product {} is not in the cart",
                product.id
            )));
        }

        let snapshot = state.cart.clone();
        state.cart.apply_delta(product, delta);
        state.pending.insert(product.id);
        state.version += 1;
        let version = state.version;
        self.inner.publish(&state);

        Ok(MutationGuard {
            inner: Arc::clone(&self.inner),
            product_id: product.id,
            delta,
            snapshot: Some(snapshot),
            version,
        })
    }
}

impl CartInner {
    fn publish(&self, state: &CartState) {
        self.view.send_replace(CartView {
            cart: state.cart.clone(),
            pending: state.pending.clone(),
        });
    }

    /// Replaces the local cart with `server`, keeping the local line of every
    /// pending product other than `settled`.
    fn adopt(&self, state: &mut CartState, server: Cart, settled: Option<ProductId>) -> Cart {
        let mut next = server;
        for &id in state.pending.iter().filter(|id| Some(**id) != settled) {
            next.restore_line_from(&state.cart, id);
        }
        state.cart = next;
        state.version += 1;
        self.publish(state);
        state.cart.clone()
    }

    fn roll_back(&self, state: &mut CartState, snapshot: &Cart, product_id: ProductId, version: u64) {
        if state.version == version {
            state.cart = snapshot.clone();
        } else {
            state.cart.restore_line_from(snapshot, product_id);
        }
        state.pending.remove(&product_id);
        state.version += 1;
        self.publish(state);
    }
}

/// One in-flight optimistic change. Undone on drop unless finished.
struct MutationGuard {
    inner: Arc<CartInner>,
    product_id: ProductId,
    delta: i32,
    snapshot: Option<Cart>,
    version: u64,
}

impl MutationGuard {
    fn finish(mut self, result: Result<Cart>) -> MutationOutcome {
        let Some(snapshot) = self.snapshot.take() else {
            return MutationOutcome::RolledBack(Error::cancelled());
        };
        let inner = Arc::clone(&self.inner);
        let mut state = inner.state.lock();

        match result {
            Ok(server) => {
                state.pending.remove(&self.product_id);
                let cart = inner.adopt(&mut state, server, Some(self.product_id));
                MutationOutcome::Committed(cart)
            }
            Err(error) => {
                inner.roll_back(&mut state, &snapshot, self.product_id, self.version);
                drop(state);
                tracing::warn!(
                    product_id = self.product_id,
                    delta = self.delta,
                    error = %error,
                    "cart mutation failed; rolled back"
                );
                let _ = inner.notices.send(CartNotice::RolledBack {
                    product_id: self.product_id,
                    delta: self.delta,
                    error: error.clone(),
                });
                MutationOutcome::RolledBack(error)
            }
        }
    }
}

impl Drop for MutationGuard {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            let mut state = self.inner.state.lock();
            self.inner
                .roll_back(&mut state, &snapshot, self.product_id, self.version);
            tracing::debug!(product_id = self.product_id, "cart mutation abandoned");
        }
    }
}
