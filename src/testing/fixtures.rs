//! Deterministic catalog and checkout fixtures.

use std::sync::Arc;

use crate::checkout::PaymentDetails;
use crate::transport::MockTransport;
use crate::types::{Product, ProductId, ShippingDetails};

const CATALOG: &[(&str, f64, &str)] = &[
    ("Laptop Air 13", 999.0, "laptops"),
    ("Laptop Pro 14", 1899.0, "laptops"),
    ("Laptop Pro 16", 2499.0, "laptops"),
    ("Gaming Laptop 17", 1799.0, "laptops"),
    ("Lapel Microphone", 39.0, "audio"),
    ("Phone Mini", 599.0, "phones"),
    ("Phone Max", 1099.0, "phones"),
    ("Phone Lite", 399.0, "phones"),
    ("Foldable Phone", 1799.0, "phones"),
    ("Rugged Phone", 449.0, "phones"),
    ("Phone Case", 29.0, "accessories"),
    ("Wireless Charger", 49.0, "accessories"),
    ("Mirrorless Camera", 1299.0, "cameras"),
    ("Compact Camera", 449.0, "cameras"),
    ("Action Camera", 349.0, "cameras"),
    ("Instant Camera", 99.0, "cameras"),
    ("Camera Tripod", 59.0, "accessories"),
    ("Webcam HD", 79.0, "accessories"),
    ("Noise-Cancelling Headphones", 349.0, "audio"),
    ("Wireless Earbuds", 179.0, "audio"),
    ("Bookshelf Speakers", 299.0, "audio"),
    ("Soundbar", 399.0, "audio"),
    ("Portable Speaker", 129.0, "audio"),
    ("Studio Monitor Headphones", 199.0, "audio"),
    ("Turntable", 249.0, "audio"),
    ("USB Microphone", 129.0, "audio"),
    ("USB-C Hub", 59.0, "accessories"),
    ("Mechanical Keyboard", 149.0, "accessories"),
    ("Wireless Mouse", 49.0, "accessories"),
    ("Monitor Arm", 119.0, "accessories"),
    ("External SSD 1TB", 139.0, "accessories"),
    ("HDMI Cable", 15.0, "accessories"),
    ("Screen Protector", 12.0, "accessories"),
    ("Power Bank", 69.0, "accessories"),
    ("Memory Card 128GB", 35.0, "accessories"),
    ("Travel Adapter", 25.0, "accessories"),
    ("Phone Plus", 899.0, "phones"),
    ("Budget Phone", 199.0, "phones"),
    ("Cinema Camera", 3999.0, "cameras"),
    ("Camera Lens 50mm", 499.0, "cameras"),
    ("DJ Controller", 299.0, "audio"),
    ("Hi-Fi Amplifier", 599.0, "audio"),
    ("Chromebook 14", 349.0, "laptops"),
    ("Ultrabook 13", 1299.0, "laptops"),
    ("Notebook 15", 799.0, "laptops"),
];

/// The sample catalog, ids `1..=45` in listing order.
///
/// Exactly five names contain "lap" and eight contain "cam".
pub fn sample_catalog() -> Vec<Product> {
    CATALOG
        .iter()
        .zip(1..)
        .map(|(&(name, price, category), id)| {
            Product::new(id, name, price, category)
                .with_image_url(format!("/images/products/{id}.jpg"))
        })
        .collect()
}

/// The sample product with `id`.
///
/// # Panics
///
/// Panics if `id` is not in `1..=45`.
#[allow(clippy::panic)]
pub fn sample_product(id: ProductId) -> Product {
    sample_catalog()
        .into_iter()
        .find(|p| p.id == id)
        .unwrap_or_else(|| panic!("no sample product with id {id}"))
}

/// A mock backend serving [`sample_catalog`] whose orders always succeed.
pub fn mock_backend() -> Arc<MockTransport> {
    Arc::new(
        MockTransport::with_catalog(sample_catalog())
            .with_seed(7)
            .with_order_failure_rate(0.0),
    )
}

/// Shipping details that pass validation.
pub fn sample_shipping() -> ShippingDetails {
    ShippingDetails {
        full_name: "Grace Hopper".into(),
        email: "grace@example.com".into(),
        phone: "+1 (555) 010-0199".into(),
        address: "1 Harbor Way".into(),
        city: "Arlington".into(),
        postal_code: "22201".into(),
        country: "US".into(),
    }
}

/// Card details that pass validation.
pub fn sample_card() -> PaymentDetails {
    PaymentDetails::card("Grace Hopper", "4242 4242 4242 4242", "12/99")
}
