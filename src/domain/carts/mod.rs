//! Carts

pub mod errors;
pub mod memory;
pub mod records;
mod repository;
pub mod service;
pub mod store;

pub use errors::{CartStoreError, CartsServiceError};
pub use memory::InMemoryCartStore;
pub use repository::PgCartStore;
pub use service::*;
pub use store::*;
