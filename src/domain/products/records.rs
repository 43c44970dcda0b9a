//! Product Records

use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::uuids::TypedUuid;

/// Product UUID
pub type ProductUuid = TypedUuid<ProductRecord>;

/// Product Record
#[derive(Debug, Clone)]
pub struct ProductRecord {
    pub uuid: ProductUuid,
    pub price: Decimal,
    pub stock: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Point-in-time view of a ledger row, read under lock during checkout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StockSnapshot {
    pub uuid: ProductUuid,
    pub price: Decimal,
    pub stock: u64,
}
