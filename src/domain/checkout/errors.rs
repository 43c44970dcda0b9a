//! Checkout errors.

use thiserror::Error;

use crate::domain::{
    carts::CartStoreError, orders::OrdersServiceError, products::records::ProductUuid,
};

/// Why a checkout did not produce an order.
///
/// Every failure inside the checkout transaction is returned only after the
/// transaction has rolled back.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No verified buyer identity was supplied.
    #[error("buyer identity is missing or invalid")]
    Unauthorized,

    /// The cart store could not be read.
    #[error("cart unavailable")]
    CartUnavailable(#[source] CartStoreError),

    /// The buyer has nothing to check out.
    #[error("cart is empty")]
    EmptyCart,

    /// A cart entry asks for more units than are in stock, or for none.
    #[error("invalid or insufficient stock for product {product}")]
    InsufficientStock { product: ProductUuid },

    /// A cart entry references a product that no longer exists.
    #[error("product {product} is no longer available")]
    ProductUnavailable { product: ProductUuid },

    /// The guarded stock decrement matched no row.
    #[error("stock for product {product} changed during checkout")]
    StockRace { product: ProductUuid },

    /// The idempotency key was used by another buyer.
    #[error("idempotency key belongs to another buyer")]
    IdempotencyConflict,

    /// The order could not be written or committed.
    #[error("failed to persist order")]
    OrderPersist(#[source] sqlx::Error),

    /// An existing order could not be read back.
    #[error("failed to load order")]
    OrderLookup(#[source] OrdersServiceError),
}

impl CheckoutError {
    /// Whether the caller may retry the identical checkout without changing anything.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::CartUnavailable(_)
                | Self::StockRace { .. }
                | Self::OrderPersist(_)
                | Self::OrderLookup(_)
        )
    }
}

impl From<sqlx::Error> for CheckoutError {
    fn from(error: sqlx::Error) -> Self {
        Self::OrderPersist(error)
    }
}
