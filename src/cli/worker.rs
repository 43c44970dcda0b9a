use storefront_orders::{context::AppContext, domain::fulfillment::FulfillmentWorker};
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::{config::FulfillmentConfig, shutdown};

pub(crate) async fn run(
    app: AppContext,
    worker: FulfillmentWorker,
    config: &FulfillmentConfig,
) -> Result<(), String> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if let Err(error) = shutdown::listen(shutdown_tx).await {
            error!("failed to listen for shutdown signal: {error}");
        }
    });

    match app.cart_store.purge_expired().await {
        Ok(purged) => info!(purged, "purged expired carts"),
        Err(error) => warn!("failed to purge expired carts: {error}"),
    }

    let handle = worker.spawn(shutdown_rx.clone());

    // Orders placed by other processes only reach this worker through the sweep.
    let queue = app.queue.clone();
    let orders = app.orders.clone();
    let period = config.reconcile_interval();
    let pending_after = config.pending_after();

    let sweep = tokio::spawn(async move {
        queue
            .reconcile_periodically(orders, period, pending_after, shutdown_rx)
            .await;
    });

    handle
        .await
        .map_err(|error| format!("fulfillment worker failed: {error}"))?;

    sweep
        .await
        .map_err(|error| format!("reconciliation sweep failed: {error}"))
}
