//! Fulfillment errors.

use thiserror::Error;

use crate::domain::orders::{OrdersServiceError, records::OrderUuid};

#[derive(Debug, Error)]
pub enum FulfillmentError {
    #[error("fulfillment queue is full; dropped order {0}")]
    QueueFull(OrderUuid),

    #[error("fulfillment worker has stopped; dropped order {0}")]
    QueueClosed(OrderUuid),

    #[error("failed to load pending orders")]
    Orders(#[from] OrdersServiceError),
}
