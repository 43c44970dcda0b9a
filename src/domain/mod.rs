//! Storefront Domain Concerns

pub mod buyers;
pub mod carts;
pub mod checkout;
pub mod fulfillment;
pub mod orders;
pub mod products;
