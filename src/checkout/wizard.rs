//! Multi-step checkout.

use std::sync::Arc;

use super::storage::{KeyValueStore, PAYMENT_KEY, SHIPPING_KEY};
use super::validation::{PaymentDetails, PersistedPayment, validate_payment, validate_shipping};
use crate::cart::CartController;
use crate::error::{Error, Result, ValidationErrors};
use crate::transport::StoreTransport;
use crate::types::{OrderReceipt, OrderRequest, ShippingDetails};

/// Steps of the checkout, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CheckoutStep {
    /// Shipping address and contact.
    #[default]
    Shipping,
    /// Payment method.
    Payment,
    /// Order summary; the order is placed from here.
    Review,
    /// Order placed.
    Confirmation,
}

impl CheckoutStep {
    /// 1-based position, for progress indicators.
    pub fn number(&self) -> u8 {
        match self {
            CheckoutStep::Shipping => 1,
            CheckoutStep::Payment => 2,
            CheckoutStep::Review => 3,
            CheckoutStep::Confirmation => 4,
        }
    }
}

/// Checkout wizard state.
///
/// Form contents are persisted to a [`KeyValueStore`] as they are set and
/// restored when a wizard is created, so a reload does not lose them. Card
/// numbers and expiry dates are never persisted.
pub struct CheckoutWizard {
    transport: Arc<dyn StoreTransport>,
    store: Arc<dyn KeyValueStore>,
    step: CheckoutStep,
    shipping: ShippingDetails,
    payment: PaymentDetails,
    field_errors: ValidationErrors,
    last_error: Option<Error>,
    attempts: u32,
    receipt: Option<OrderReceipt>,
}

impl std::fmt::Debug for CheckoutWizard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutWizard")
            .field("step", &self.step)
            .field("payment", &self.payment)
            .field("attempts", &self.attempts)
            .finish_non_exhaustive()
    }
}

impl CheckoutWizard {
    /// Creates a wizard at the shipping step, restoring persisted form data.
    pub fn new(transport: Arc<dyn StoreTransport>, store: Arc<dyn KeyValueStore>) -> Self {
        let shipping = restore::<ShippingDetails>(store.as_ref(), SHIPPING_KEY).unwrap_or_default();
        let payment = restore::<PersistedPayment>(store.as_ref(), PAYMENT_KEY)
            .map(|saved| PaymentDetails {
                method: saved.method,
                cardholder_name: saved.cardholder_name,
                ..Default::default()
            })
            .unwrap_or_default();

        Self {
            transport,
            store,
            step: CheckoutStep::Shipping,
            shipping,
            payment,
            field_errors: ValidationErrors::new(),
            last_error: None,
            attempts: 0,
            receipt: None,
        }
    }

    /// Current step.
    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    /// Shipping form.
    pub fn shipping(&self) -> &ShippingDetails {
        &self.shipping
    }

    /// Payment form.
    pub fn payment(&self) -> &PaymentDetails {
        &self.payment
    }

    /// Field errors from the last failed [`next`](Self::next).
    pub fn field_errors(&self) -> &ValidationErrors {
        &self.field_errors
    }

    /// Error of the last failed order attempt.
    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    /// Number of order attempts so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Receipt of the placed order, once at [`CheckoutStep::Confirmation`].
    pub fn receipt(&self) -> Option<&OrderReceipt> {
        self.receipt.as_ref()
    }

    /// Replaces the shipping form and persists it.
    pub fn set_shipping(&mut self, details: ShippingDetails) {
        persist(self.store.as_ref(), SHIPPING_KEY, &details);
        self.shipping = details;
    }

    /// Replaces the payment form and persists its non-sensitive fields.
    pub fn set_payment(&mut self, details: PaymentDetails) {
        persist(self.store.as_ref(), PAYMENT_KEY, &PersistedPayment::from(&details));
        self.payment = details;
    }

    /// Validates the current step and advances.
    ///
    /// # Errors
    ///
    /// `Validation` when a field fails (see [`field_errors`](Self::field_errors));
    /// `InvalidArgument` from Review, which advances only through
    /// [`place_order`](Self::place_order), and from Confirmation.
    pub fn next(&mut self) -> Result<CheckoutStep> {
        let check = match self.step {
            CheckoutStep::Shipping => validate_shipping(&self.shipping),
            CheckoutStep::Payment => validate_payment(&self.payment),
            CheckoutStep::Review => {
                return Err(Error::invalid_argument("place the order to continue"));
            }
            CheckoutStep::Confirmation => {
                return Err(Error::invalid_argument("checkout is complete"));
            }
        };

        match check {
            Ok(()) => {
                self.field_errors = ValidationErrors::new();
                self.step = match self.step {
                    CheckoutStep::Shipping => CheckoutStep::Payment,
                    _ => CheckoutStep::Review,
                };
                Ok(self.step)
            }
            Err(errors) => {
                self.field_errors = errors.clone();
                Err(errors.into())
            }
        }
    }

    /// Returns to the previous step. Not possible from Shipping or Confirmation.
    pub fn back(&mut self) -> Option<CheckoutStep> {
        let previous = match self.step {
            CheckoutStep::Payment => CheckoutStep::Shipping,
            CheckoutStep::Review => CheckoutStep::Payment,
            CheckoutStep::Shipping | CheckoutStep::Confirmation => return None,
        };
        self.step = previous;
        Some(previous)
    }

    /// Submits the cart as an order.
    ///
    /// On success the persisted forms are removed, the local cart is emptied and
    /// the wizard moves to Confirmation. On failure the wizard stays on Review
    /// with the cart untouched; calling again retries.
    pub async fn place_order(&mut self, cart: &CartController) -> Result<OrderReceipt> {
        if self.step != CheckoutStep::Review {
            return Err(Error::invalid_argument("orders are placed from the review step"));
        }
        let contents = cart.cart();
        if contents.is_empty() {
            return Err(Error::invalid_argument("cart is empty"));
        }
        validate_shipping(&self.shipping)?;
        validate_payment(&self.payment)?;

        let card_last4 = if self.payment.method.requires_card() {
            self.payment.card_last4()
        } else {
            None
        };
        let order = OrderRequest::from_cart(
            &contents,
            self.shipping.clone(),
            self.payment.method,
            card_last4,
        );

        self.attempts += 1;
        match self.transport.place_order(&order).await {
            Ok(receipt) => {
                tracing::info!(
                    order_id = ?receipt.order_id,
                    items = contents.total_items(),
                    attempts = self.attempts,
                    "order placed"
                );
                for key in [SHIPPING_KEY, PAYMENT_KEY] {
                    if let Err(e) = self.store.remove(key) {
                        tracing::warn!(key, error = %e, "failed to clear checkout state");
                    }
                }
                cart.clear_local();
                self.last_error = None;
                self.step = CheckoutStep::Confirmation;
                self.receipt = Some(receipt.clone());
                Ok(receipt)
            }
            Err(e) => {
                tracing::info!(attempts = self.attempts, error = %e, "order placement failed");
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }
}

fn restore<T: serde::de::DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(raw) => raw?,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to read checkout state");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "ignoring unreadable checkout state");
            None
        }
    }
}

fn persist<T: serde::Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) {
    let result = serde_json::to_string(value)
        .map_err(Error::from)
        .and_then(|json| store.set(key, &json));
    if let Err(e) = result {
        tracing::warn!(key, error = %e, "failed to persist checkout state");
    }
}
