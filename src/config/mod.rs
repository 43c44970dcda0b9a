//! Process configuration

use storefront_orders::context::AppSettings;

pub(crate) mod cart;
pub(crate) mod db;
pub(crate) mod fulfillment;
pub(crate) mod observability;

pub(crate) use cart::CartConfig;
pub(crate) use db::DatabaseConfig;
pub(crate) use fulfillment::FulfillmentConfig;
pub(crate) use observability::{LogFormat, LoggingConfig};

/// Collapse the flattened config groups into what [`AppSettings`] needs.
pub(crate) fn app_settings(
    database: &DatabaseConfig,
    cart: &CartConfig,
    fulfillment: &FulfillmentConfig,
) -> AppSettings {
    AppSettings {
        database_url: database.database_url.clone(),
        cart_ttl: cart.ttl(),
        queue_capacity: fulfillment.queue_capacity,
        fulfillment_delay: fulfillment.delay(),
    }
}
