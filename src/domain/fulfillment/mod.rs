//! Fulfillment

pub mod errors;
pub mod queue;
pub mod worker;

pub use errors::FulfillmentError;
pub use queue::*;
pub use worker::*;
