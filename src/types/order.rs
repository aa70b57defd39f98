//! Order placement types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cart::Cart;
use super::product::ProductId;

/// Where the order ships.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingDetails {
    /// Recipient name.
    pub full_name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone.
    pub phone: String,
    /// Street address.
    pub address: String,
    /// City.
    pub city: String,
    /// Postal code.
    pub postal_code: String,
    /// Country.
    pub country: String,
}

/// How the shopper pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Credit or debit card.
    #[default]
    Card,
    /// PayPal redirect.
    PayPal,
    /// Pay the courier.
    CashOnDelivery,
}

impl PaymentMethod {
    /// Returns `true` if card fields are required.
    pub fn requires_card(&self) -> bool {
        matches!(self, PaymentMethod::Card)
    }
}

/// One line of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Ordered product.
    pub product_id: ProductId,
    /// Ordered quantity.
    pub quantity: u32,
}

/// Body of `POST /orders`.
///
/// Card data never leaves the client except the last four digits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    /// Lines taken from the cart.
    pub items: Vec<OrderItem>,
    /// Shipping destination.
    pub shipping: ShippingDetails,
    /// Payment method.
    pub payment_method: PaymentMethod,
    /// Last four card digits, for card payments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_last4: Option<String>,
    /// Cart total at submission time.
    pub total_price: f64,
}

impl OrderRequest {
    /// Builds an order for every line in `cart`.
    pub fn from_cart(
        cart: &Cart,
        shipping: ShippingDetails,
        payment_method: PaymentMethod,
        card_last4: Option<String>,
    ) -> Self {
        Self {
            items: cart
                .items()
                .iter()
                .map(|line| OrderItem {
                    product_id: line.product.id,
                    quantity: line.quantity,
                })
                .collect(),
            shipping,
            payment_method,
            card_last4,
            total_price: cart.total_price(),
        }
    }
}

/// Result of a successful order placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReceipt {
    /// Server-issued order id, when the server sent one.
    pub order_id: Option<String>,
    /// When the client saw the order accepted.
    pub placed_at: DateTime<Utc>,
}

/// Optional body of a successful `POST /orders`; only the status is relied upon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrderResponseDto {
    #[serde(default, alias = "id")]
    pub order_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Product;

    #[test]
    fn test_order_from_cart() {
        let mut cart = Cart::new();
        cart.apply_delta(&Product::new(1, "Phone", 300.0, "phones"), 2);
        cart.apply_delta(&Product::new(2, "Case", 20.0, "accessories"), 1);

        let order = OrderRequest::from_cart(
            &cart,
            ShippingDetails::default(),
            PaymentMethod::Card,
            Some("4242".into()),
        );
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0], OrderItem { product_id: 1, quantity: 2 });
        assert_eq!(order.total_price, 620.0);
    }

    #[test]
    fn test_payment_method_wire_names() {
        let json = serde_json::to_string(&PaymentMethod::CashOnDelivery).unwrap();
        assert_eq!(json, "\"cash_on_delivery\"");
        assert!(!PaymentMethod::PayPal.requires_card());
    }

    #[test]
    fn test_response_accepts_id_alias() {
        let dto: OrderResponseDto = serde_json::from_str(r#"{"id":"ord_1"}"#).unwrap();
        assert_eq!(dto.order_id.as_deref(), Some("ord_1"));
    }
}
