//! Carts service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;

use crate::domain::{
    buyers::BuyerUuid,
    carts::{errors::CartsServiceError, records::CartEntry, store::CartStore},
    products::records::ProductUuid,
};

/// Cart mutations layered over a [`CartStore`].
///
/// Each operation is a read-modify-write of one buyer's cart.
pub struct StoreCartsService {
    store: Arc<dyn CartStore>,
}

impl StoreCartsService {
    /// Creates a new service over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn CartStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CartsService for StoreCartsService {
    async fn get_cart(&self, buyer: BuyerUuid) -> Result<Vec<CartEntry>, CartsServiceError> {
        Ok(self.store.get(buyer).await?)
    }

    async fn add_item(
        &self,
        buyer: BuyerUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<Vec<CartEntry>, CartsServiceError> {
        if quantity == 0 {
            return Err(CartsServiceError::InvalidQuantity);
        }

        let mut entries = self.store.get(buyer).await?;

        match entries.iter_mut().find(|entry| entry.product == product) {
            Some(entry) => {
                entry.quantity = entry
                    .quantity
                    .checked_add(quantity)
                    .ok_or(CartsServiceError::QuantityOverflow { product })?;
            }
            None => entries.push(CartEntry::new(product, quantity)),
        }

        self.store.set(buyer, entries.clone()).await?;

        Ok(entries)
    }

    async fn update_item(
        &self,
        buyer: BuyerUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<Vec<CartEntry>, CartsServiceError> {
        let mut entries = self.store.get(buyer).await?;

        let position = entries
            .iter()
            .position(|entry| entry.product == product)
            .ok_or(CartsServiceError::ItemNotFound { product })?;

        if quantity == 0 {
            entries.remove(position);
        } else if let Some(entry) = entries.get_mut(position) {
            entry.quantity = quantity;
        }

        self.store.set(buyer, entries.clone()).await?;

        Ok(entries)
    }

    async fn remove_item(
        &self,
        buyer: BuyerUuid,
        product: ProductUuid,
    ) -> Result<Vec<CartEntry>, CartsServiceError> {
        let mut entries = self.store.get(buyer).await?;
        let before = entries.len();

        entries.retain(|entry| entry.product != product);

        if entries.len() != before {
            self.store.set(buyer, entries.clone()).await?;
        }

        Ok(entries)
    }
}

#[automock]
#[async_trait]
/// Buyer-facing cart operations.
pub trait CartsService: Send + Sync {
    /// The buyer's current cart.
    async fn get_cart(&self, buyer: BuyerUuid) -> Result<Vec<CartEntry>, CartsServiceError>;

    /// Adds `quantity` units of `product`, merging with an existing entry.
    async fn add_item(
        &self,
        buyer: BuyerUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<Vec<CartEntry>, CartsServiceError>;

    /// Sets the quantity of an existing entry; zero removes it.
    async fn update_item(
        &self,
        buyer: BuyerUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<Vec<CartEntry>, CartsServiceError>;

    /// Removes the entry for `product`, if present.
    async fn remove_item(
        &self,
        buyer: BuyerUuid,
        product: ProductUuid,
    ) -> Result<Vec<CartEntry>, CartsServiceError>;
}
