//! Cart errors.

use thiserror::Error;

use crate::domain::products::records::ProductUuid;

/// Errors raised by a [`CartStore`](super::CartStore).
#[derive(Debug, Error)]
pub enum CartStoreError {
    /// The backing store could not be reached or failed mid-operation.
    #[error("cart store unavailable")]
    Unavailable(#[source] sqlx::Error),

    /// Entries with a zero quantity are never persisted.
    #[error("cart entry for product {product} has zero quantity")]
    InvalidQuantity { product: ProductUuid },
}

impl From<sqlx::Error> for CartStoreError {
    fn from(error: sqlx::Error) -> Self {
        Self::Unavailable(error)
    }
}

/// Errors raised by cart mutations.
#[derive(Debug, Error)]
pub enum CartsServiceError {
    #[error("quantity must be greater than zero")]
    InvalidQuantity,

    #[error("product {product} is not in the cart")]
    ItemNotFound { product: ProductUuid },

    #[error("quantity overflow for product {product}")]
    QuantityOverflow { product: ProductUuid },

    #[error(transparent)]
    Store(#[from] CartStoreError),
}
