//! Cart Store Config

use std::time::Duration;

use clap::Args;
use storefront_orders::domain::carts::DEFAULT_CART_TTL_SECS;

/// Cart store settings.
#[derive(Debug, Args)]
pub(crate) struct CartConfig {
    /// Seconds a cart lives after its last write
    #[arg(long, env = "CART_TTL_SECONDS", default_value_t = DEFAULT_CART_TTL_SECS)]
    pub cart_ttl_seconds: u64,
}

impl CartConfig {
    pub(crate) fn ttl(&self) -> Duration {
        Duration::from_secs(self.cart_ttl_seconds)
    }
}
