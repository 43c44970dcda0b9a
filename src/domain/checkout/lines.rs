//! Cart lines as checkout sees them.

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;

use crate::domain::{
    carts::records::CartEntry,
    checkout::errors::CheckoutError,
    products::records::{ProductUuid, StockSnapshot},
};

/// A cart with one line per product, ordered by product.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CheckoutLines {
    lines: Vec<CartEntry>,
}

/// A line validated against the locked ledger, carrying its purchase-time price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PricedLine {
    pub(crate) product: ProductUuid,
    pub(crate) quantity: u32,
    pub(crate) unit_price: Decimal,
}

impl CheckoutLines {
    /// Merge duplicate entries for the same product by summing their quantities.
    pub(crate) fn from_entries(entries: &[CartEntry]) -> Result<Self, CheckoutError> {
        if entries.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let mut quantities = FxHashMap::<ProductUuid, u32>::default();

        for entry in entries {
            let quantity = quantities.entry(entry.product).or_default();
            // saturating is fine: no ledger row holds u32::MAX units
            *quantity = quantity.saturating_add(entry.quantity);
        }

        let mut lines: Vec<CartEntry> = quantities
            .into_iter()
            .map(|(product, quantity)| CartEntry::new(product, quantity))
            .collect();

        lines.sort_by_key(|line| line.product);

        Ok(Self { lines })
    }

    pub(crate) fn products(&self) -> Vec<ProductUuid> {
        self.lines.iter().map(|line| line.product).collect()
    }

    /// Validate every line against `ledger`. The whole cart fails on the first bad line.
    pub(crate) fn price(&self, ledger: &[StockSnapshot]) -> Result<Vec<PricedLine>, CheckoutError> {
        self.lines
            .iter()
            .map(|line| {
                let snapshot = ledger
                    .iter()
                    .find(|snapshot| snapshot.uuid == line.product)
                    .ok_or(CheckoutError::ProductUnavailable {
                        product: line.product,
                    })?;

                if line.quantity == 0 || u64::from(line.quantity) > snapshot.stock {
                    return Err(CheckoutError::InsufficientStock {
                        product: line.product,
                    });
                }

                Ok(PricedLine {
                    product: line.product,
                    quantity: line.quantity,
                    unit_price: snapshot.price,
                })
            })
            .collect()
    }
}
