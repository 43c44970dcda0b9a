//! Storefront Orders
//!
//! Cart storage, transactional checkout and asynchronous order fulfillment for
//! a multi-vendor storefront.

pub mod context;
pub mod database;
pub mod domain;
pub mod uuids;

#[cfg(test)]
mod test;
