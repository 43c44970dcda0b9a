//! Order Data

use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::domain::{
    buyers::BuyerUuid,
    orders::records::{OrderItemUuid, OrderUuid},
    products::records::ProductUuid,
};

/// New Order Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub uuid: OrderUuid,
    pub buyer: BuyerUuid,
    pub total: Decimal,
    pub placed_at: Timestamp,
    pub idempotency_key: Option<String>,
}

/// New Order Item Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub uuid: OrderItemUuid,
    pub product: ProductUuid,
    pub quantity: u32,
    pub price_at_purchase: Decimal,
}
