//! Cart Records

use serde::{Deserialize, Serialize};

use crate::domain::products::records::ProductUuid;

/// A single pending selection in a buyer's cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    pub product: ProductUuid,
    pub quantity: u32,
}

impl CartEntry {
    /// Creates an entry for `quantity` units of `product`.
    pub const fn new(product: ProductUuid, quantity: u32) -> Self {
        Self { product, quantity }
    }
}
