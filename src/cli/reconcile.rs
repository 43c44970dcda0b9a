use storefront_orders::{context::AppContext, domain::fulfillment::FulfillmentWorker};
use tokio::sync::watch;
use tracing::error;

use crate::{config::FulfillmentConfig, shutdown};

/// Requeue one queue's worth of stale orders and fulfill them before exiting.
pub(crate) async fn run(
    app: AppContext,
    worker: FulfillmentWorker,
    config: &FulfillmentConfig,
) -> Result<(), String> {
    let published = app
        .queue
        .reconcile(app.orders.as_ref(), config.reconcile_cutoff())
        .await
        .map_err(|error| format!("failed to reconcile pending orders: {error}"))?;

    println!("requeued: {published}");

    // Closing every sender lets the worker stop once the queue is drained.
    drop(app);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if let Err(error) = shutdown::listen(shutdown_tx).await {
            error!("failed to listen for shutdown signal: {error}");
        }
    });

    worker.run(shutdown_rx).await;

    Ok(())
}
