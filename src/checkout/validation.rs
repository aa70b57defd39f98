//! Checkout form fields and their rules.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationErrors;
use crate::types::{PaymentMethod, ShippingDetails};

/// Payment form contents.
///
/// Only `method`, `cardholder_name` and the last four card digits are ever
/// persisted or sent; see [`PersistedPayment`].
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PaymentDetails {
    /// Chosen payment method.
    pub method: PaymentMethod,
    /// Name on the card.
    pub cardholder_name: String,
    /// Card number as typed; spaces and dashes are ignored.
    pub card_number: String,
    /// Expiry as `MM/YY`.
    pub expiry: String,
}

impl std::fmt::Debug for PaymentDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentDetails")
            .field("method", &self.method)
            .field("cardholder_name", &self.cardholder_name)
            .field("card_last4", &self.card_last4())
            .finish_non_exhaustive()
    }
}

impl PaymentDetails {
    /// Card payment details.
    pub fn card(
        cardholder_name: impl Into<String>,
        card_number: impl Into<String>,
        expiry: impl Into<String>,
    ) -> Self {
        Self {
            method: PaymentMethod::Card,
            cardholder_name: cardholder_name.into(),
            card_number: card_number.into(),
            expiry: expiry.into(),
        }
    }

    /// Details for a method that needs no card.
    pub fn without_card(method: PaymentMethod) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    /// Last four digits of the card number, if it has at least four.
    pub fn card_last4(&self) -> Option<String> {
        let digits = card_digits(&self.card_number);
        (digits.len() >= 4).then(|| digits[digits.len() - 4..].to_string())
    }
}

/// The payment fields that survive a reload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedPayment {
    /// Chosen payment method.
    pub method: PaymentMethod,
    /// Name on the card.
    #[serde(default)]
    pub cardholder_name: String,
    /// Last four card digits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_last4: Option<String>,
}

impl From<&PaymentDetails> for PersistedPayment {
    fn from(details: &PaymentDetails) -> Self {
        Self {
            method: details.method,
            cardholder_name: details.cardholder_name.clone(),
            card_last4: details
                .method
                .requires_card()
                .then(|| details.card_last4())
                .flatten(),
        }
    }
}

/// Checks every shipping field.
pub fn validate_shipping(details: &ShippingDetails) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let required = [
        ("full_name", &details.full_name),
        ("email", &details.email),
        ("phone", &details.phone),
        ("address", &details.address),
        ("city", &details.city),
        ("postal_code", &details.postal_code),
        ("country", &details.country),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            errors.add(field, "is required");
        }
    }

    if !details.email.trim().is_empty() && !is_valid_email(details.email.trim()) {
        errors.add("email", "is not a valid email address");
    }
    if !details.phone.trim().is_empty() && !is_valid_phone(&details.phone) {
        errors.add("phone", "must have 7 to 15 digits");
    }
    if !details.postal_code.trim().is_empty() && !is_valid_postal_code(details.postal_code.trim()) {
        errors.add("postal_code", "is not a valid postal code");
    }

    errors.into_result()
}

/// Checks the payment fields; card fields only matter for card payments.
pub fn validate_payment(details: &PaymentDetails) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if !details.method.requires_card() {
        return Ok(());
    }

    if details.cardholder_name.trim().is_empty() {
        errors.add("cardholder_name", "is required");
    }

    let digits = card_digits(&details.card_number);
    if digits.is_empty() {
        errors.add("card_number", "is required");
    } else if !(12..=19).contains(&digits.len())
        || details
            .card_number
            .chars()
            .any(|c| !(c.is_ascii_digit() || c == ' ' || c == '-'))
    {
        errors.add("card_number", "must have 12 to 19 digits");
    } else if !luhn_valid(&digits) {
        errors.add("card_number", "is not a valid card number");
    }

    match parse_expiry(details.expiry.trim()) {
        None if details.expiry.trim().is_empty() => errors.add("expiry", "is required"),
        None => errors.add("expiry", "must be MM/YY"),
        Some((month, year)) => {
            let today = Utc::now().date_naive();
            if (year, month) < (today.year(), today.month()) {
                errors.add("expiry", "card has expired");
            }
        }
    }

    errors.into_result()
}

/// Luhn checksum over a string of ASCII digits.
///
/// ```rust
/// use storefront::checkout::luhn_valid;
///
/// assert!(luhn_valid("4242424242424242"));
/// assert!(!luhn_valid("4242424242424241"));
/// ```
pub fn luhn_valid(digits: &str) -> bool {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let sum: u32 = digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = u32::from(b - b'0');
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

fn card_digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && !email.contains(char::is_whitespace)
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty())
}

fn is_valid_phone(phone: &str) -> bool {
    let mut digits = 0;
    for c in phone.chars() {
        match c {
            '0'..='9' => digits += 1,
            ' ' | '+' | '-' | '(' | ')' => {}
            _ => return false,
        }
    }
    (7..=15).contains(&digits)
}

fn is_valid_postal_code(code: &str) -> bool {
    (3..=10).contains(&code.chars().count())
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-')
}

/// Parses `MM/YY` into `(month, full year)`.
fn parse_expiry(raw: &str) -> Option<(u32, i32)> {
    let (month, year) = raw.split_once('/')?;
    if month.len() != 2 || year.len() != 2 {
        return None;
    }
    let month: u32 = month.parse().ok()?;
    let year: i32 = year.parse().ok()?;
    (1..=12).contains(&month).then_some((month, 2000 + year))
}
