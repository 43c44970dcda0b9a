//! Checkout

pub mod errors;
mod lines;
pub mod service;
pub mod totals;

pub use errors::CheckoutError;
pub use service::*;
