//! Cart store contract.

use async_trait::async_trait;
use mockall::automock;

use crate::domain::{
    buyers::BuyerUuid,
    carts::{errors::CartStoreError, records::CartEntry},
};

/// Default lifetime of a cart after its last write.
pub const DEFAULT_CART_TTL_SECS: u64 = 1_000 * 60;

#[automock]
#[async_trait]
/// Ephemeral key-value view of each buyer's pending selections, with expiry.
///
/// Implementations must report an unreachable backend as
/// [`CartStoreError::Unavailable`] rather than as an empty cart.
pub trait CartStore: Send + Sync {
    /// The buyer's entries; empty when the cart is absent or expired.
    async fn get(&self, buyer: BuyerUuid) -> Result<Vec<CartEntry>, CartStoreError>;

    /// Overwrite the buyer's entries and refresh the expiry.
    async fn set(&self, buyer: BuyerUuid, entries: Vec<CartEntry>) -> Result<(), CartStoreError>;

    /// Remove the buyer's cart.
    async fn clear(&self, buyer: BuyerUuid) -> Result<(), CartStoreError>;
}

pub(crate) fn validate_entries(entries: &[CartEntry]) -> Result<(), CartStoreError> {
    match entries.iter().find(|entry| entry.quantity == 0) {
        Some(entry) => Err(CartStoreError::InvalidQuantity {
            product: entry.product,
        }),
        None => Ok(()),
    }
}
