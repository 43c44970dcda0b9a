//! Fulfillment Config

use std::time::Duration;

use clap::Args;
use jiff::Timestamp;
use storefront_orders::domain::fulfillment::{DEFAULT_QUEUE_CAPACITY, stale_cutoff};

/// Fulfillment queue and worker settings.
#[derive(Debug, Args)]
pub(crate) struct FulfillmentConfig {
    /// Order ids buffered between checkout and the worker
    #[arg(long, env = "FULFILLMENT_QUEUE_CAPACITY", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Milliseconds spent on the simulated provisioning step
    #[arg(long, env = "FULFILLMENT_DELAY_MS", default_value_t = 3_000)]
    pub fulfillment_delay_ms: u64,

    /// Age after which a `PENDING` order is requeued by reconciliation
    #[arg(long, env = "RECONCILE_PENDING_AFTER_SECONDS", default_value_t = 300)]
    pub reconcile_pending_after_seconds: u64,

    /// Seconds between reconciliation sweeps while the worker runs
    #[arg(
        long,
        env = "RECONCILE_INTERVAL_SECONDS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub reconcile_interval_seconds: u64,
}

impl FulfillmentConfig {
    pub(crate) fn delay(&self) -> Duration {
        Duration::from_millis(self.fulfillment_delay_ms)
    }

    /// How long an order may stay `PENDING` before reconciliation requeues it.
    pub(crate) fn pending_after(&self) -> Duration {
        Duration::from_secs(self.reconcile_pending_after_seconds)
    }

    pub(crate) fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval_seconds)
    }

    /// Orders placed before this instant count as stale.
    pub(crate) fn reconcile_cutoff(&self) -> Timestamp {
        stale_cutoff(self.pending_after())
    }
}
