//! Shopping cart snapshot and its wire shapes.

use serde::{Deserialize, Serialize};

use super::product::{Product, ProductId};

/// One cart line: a product and how many of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// The product on this line.
    pub product: Product,
    /// Quantity, always at least 1.
    pub quantity: u32,
}

impl CartLine {
    /// `quantity × price` for this line.
    pub fn subtotal(&self) -> f64 {
        f64::from(self.quantity) * self.product.price
    }
}

/// A cart snapshot.
///
/// `total_items` and `total_price` always equal the sums over `items`; every
/// constructor and mutation recomputes them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cart {
    items: Vec<CartLine>,
    total_price: f64,
    total_items: u32,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a cart from lines, dropping empty ones and computing totals.
    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> Self {
        let mut cart = Cart {
            items: lines
                .into_iter()
                .filter(|line| line.quantity > 0)
                .map(|mut line| {
                    line.product.item_in_cart = line.quantity;
                    line.product.loading = false;
                    line
                })
                .collect(),
            ..Default::default()
        };
        cart.recalculate();
        cart
    }

    /// Lines in cart order.
    pub fn items(&self) -> &[CartLine] {
        &self.items
    }

    /// `Σ quantity × price`.
    pub fn total_price(&self) -> f64 {
        self.total_price
    }

    /// `Σ quantity`.
    pub fn total_items(&self) -> u32 {
        self.total_items
    }

    /// Returns `true` if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The line for `product_id`, if present.
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.items.iter().find(|line| line.product.id == product_id)
    }

    /// Quantity of `product_id` in the cart (0 when absent).
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.line(product_id).map_or(0, |line| line.quantity)
    }

    /// Applies a signed quantity delta locally.
    ///
    /// Removes the line when the result is ≤ 0 and appends a new line when none
    /// existed and `delta` is positive. A negative delta on an absent line is a no-op.
    pub fn apply_delta(&mut self, product: &Product, delta: i32) {
        match self.items.iter().position(|l| l.product.id == product.id) {
            Some(index) => {
                let current = i64::from(self.items[index].quantity);
                let next = current + i64::from(delta);
                if next <= 0 {
                    self.items.remove(index);
                } else {
                    let line = &mut self.items[index];
                    line.quantity = u32::try_from(next).unwrap_or(u32::MAX);
                    line.product.item_in_cart = line.quantity;
                }
            }
            None if delta > 0 => {
                let mut product = product.clone();
                product.item_in_cart = delta.unsigned_abs();
                product.loading = false;
                self.items.push(CartLine {
                    product,
                    quantity: delta.unsigned_abs(),
                });
            }
            None => {}
        }
        self.recalculate();
    }

    /// Copies the line for `product_id` from `snapshot` into this cart, keeping
    /// every other line as is. The line is removed if the snapshot lacks it and
    /// returns to its snapshot position otherwise.
    pub fn restore_line_from(&mut self, snapshot: &Cart, product_id: ProductId) {
        self.items.retain(|line| line.product.id != product_id);
        if let Some(index) = snapshot
            .items
            .iter()
            .position(|line| line.product.id == product_id)
        {
            let at = index.min(self.items.len());
            self.items.insert(at, snapshot.items[index].clone());
        }
        self.recalculate();
    }

    /// Removes every line.
    pub fn clear(&mut self) {
        self.items.clear();
        self.recalculate();
    }

    fn recalculate(&mut self) {
        self.total_items = self.items.iter().map(|line| line.quantity).sum();
        self.total_price = self.items.iter().map(CartLine::subtotal).sum();
    }
}

/// Request body of `POST /cart`: a signed quantity delta for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMutation {
    /// Product to change.
    pub product_id: ProductId,
    /// Signed quantity delta.
    pub quantity: i32,
}

/// Cart line as either backend variant sends it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum CartLineDto {
    /// `{ "product": {...}, "quantity": n }`
    Pair { product: Product, quantity: u32 },
    /// A product carrying its quantity in `itemInCart`.
    Flat(Product),
}

/// Wire shape of `GET /cart` and `POST /cart` responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CartDto {
    #[serde(default, alias = "products")]
    pub items: Vec<CartLineDto>,
    #[serde(default)]
    pub total_price: Option<f64>,
    #[serde(default)]
    pub total_items: Option<u32>,
}

impl CartDto {
    /// Converts to a [`Cart`], recomputing totals from the lines.
    pub(crate) fn into_cart(self) -> Cart {
        let reported_items = self.total_items;
        let reported_price = self.total_price;
        let cart = Cart::from_lines(self.items.into_iter().map(|line| match line {
            CartLineDto::Pair { product, quantity } => CartLine { product, quantity },
            CartLineDto::Flat(product) => CartLine {
                quantity: product.item_in_cart,
                product,
            },
        }));

        let items_disagree = reported_items.is_some_and(|n| n != cart.total_items());
        let price_disagrees =
            reported_price.is_some_and(|p| (p - cart.total_price()).abs() > 0.005);
        if items_disagree || price_disagrees {
            tracing::warn!(
                reported_items = ?reported_items,
                reported_price = ?reported_price,
                total_items = cart.total_items(),
                total_price = cart.total_price(),
                "server cart totals disagree with its lines; using line sums"
            );
        }
        cart
    }
}

impl From<&Cart> for CartDto {
    fn from(cart: &Cart) -> Self {
        CartDto {
            items: cart
                .items()
                .iter()
                .map(|line| CartLineDto::Pair {
                    product: line.product.clone(),
                    quantity: line.quantity,
                })
                .collect(),
            total_price: Some(cart.total_price()),
            total_items: Some(cart.total_items()),
        }
    }
}
