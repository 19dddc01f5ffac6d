//! Order line items.

use serde::{Deserialize, Serialize};

/// A single line of an order: a product SKU and the quantity ordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// The product SKU.
    pub sku: String,

    /// Quantity ordered.
    pub quantity: u32,
}

impl LineItem {
    /// Creates a new line item.
    pub fn new(sku: impl Into<String>, quantity: u32) -> Self {
        Self {
            sku: sku.into(),
            quantity,
        }
    }
}
