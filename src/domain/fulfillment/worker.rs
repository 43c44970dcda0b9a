//! Fulfillment worker.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc::Receiver, watch},
    task::JoinHandle,
};
use tracing::{debug, error, info, instrument, warn};

use crate::domain::orders::{OrdersService, OrdersServiceError, records::OrderUuid};

/// Default time spent on the simulated provisioning step.
pub const DEFAULT_FULFILLMENT_DELAY: Duration = Duration::from_secs(3);

/// The single consumer of the fulfillment queue.
///
/// Each order is moved `PENDING → PROCESSING`, held for the fulfillment delay,
/// then moved to `SUCCESS`. Failures are logged and the order is abandoned.
pub struct FulfillmentWorker {
    orders: Arc<dyn OrdersService>,
    receiver: Receiver<OrderUuid>,
    delay: Duration,
}

impl FulfillmentWorker {
    /// Creates a worker draining `receiver`.
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrdersService>,
        receiver: Receiver<OrderUuid>,
        delay: Duration,
    ) -> Self {
        Self {
            orders,
            receiver,
            delay,
        }
    }

    /// Run on a background task until shutdown.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Process orders until `shutdown` flips to `true`, its sender is dropped,
    /// or every queue producer is gone and the queue is drained.
    ///
    /// An order already being processed is finished before the loop exits.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("fulfillment worker started");

        while !*shutdown.borrow() {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }

                next = self.receiver.recv() => {
                    let Some(order) = next else {
                        break;
                    };

                    self.fulfill(order).await;
                }
            }
        }

        info!("fulfillment worker stopped");
    }

    #[instrument(skip(self), fields(order = %order))]
    async fn fulfill(&self, order: OrderUuid) {
        match self.orders.mark_processing(order).await {
            Ok(()) => {}
            Err(OrdersServiceError::InvalidTransition { .. }) => {
                debug!("order already left PENDING; skipping duplicate delivery");
                return;
            }
            Err(OrdersServiceError::NotFound) => {
                warn!("order not found; skipping");
                return;
            }
            Err(error) => {
                error!("failed to mark order processing: {error}");
                return;
            }
        }

        tokio::time::sleep(self.delay).await;

        match self.orders.mark_succeeded(order).await {
            Ok(()) => info!("order fulfilled"),
            Err(error) => error!("failed to mark order succeeded: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use mockall::{Sequence, predicate::eq};
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::{
        domain::{
            fulfillment::{FulfillmentQueue, OrderPublisher},
            orders::{MockOrdersService, records::OrderStatus},
        },
        test::TestContext,
    };

    use super::*;

    #[tokio::test]
    async fn marks_order_processing_then_succeeded() -> TestResult {
        let order = OrderUuid::new();
        let mut orders = MockOrdersService::new();
        let mut sequence = Sequence::new();

        orders
            .expect_mark_processing()
            .with(eq(order))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(()));
        orders
            .expect_mark_succeeded()
            .with(eq(order))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(()));

        let (queue, receiver) = FulfillmentQueue::bounded(4);
        let (_shutdown_tx, shutdown) = watch::channel(false);

        queue.publish(order)?;
        drop(queue);

        FulfillmentWorker::new(Arc::new(orders), receiver, Duration::ZERO)
            .run(shutdown)
            .await;

        Ok(())
    }

    #[tokio::test]
    async fn duplicate_delivery_is_skipped() -> TestResult {
        let order = OrderUuid::new();
        let mut orders = MockOrdersService::new();

        orders.expect_mark_processing().times(1).returning(|_| {
            Err(OrdersServiceError::InvalidTransition {
                to: OrderStatus::Processing,
            })
        });
        orders.expect_mark_succeeded().never();

        let (queue, receiver) = FulfillmentQueue::bounded(4);
        let (_shutdown_tx, shutdown) = watch::channel(false);

        queue.publish(order)?;
        drop(queue);

        FulfillmentWorker::new(Arc::new(orders), receiver, Duration::ZERO)
            .run(shutdown)
            .await;

        Ok(())
    }

    #[tokio::test]
    async fn status_update_failure_does_not_stop_the_worker() -> TestResult {
        let failing = OrderUuid::new();
        let healthy = OrderUuid::new();
        let mut orders = MockOrdersService::new();

        orders.expect_mark_processing().times(2).returning(|_| Ok(()));
        orders
            .expect_mark_succeeded()
            .with(eq(failing))
            .times(1)
            .returning(|_| Err(OrdersServiceError::Sql(sqlx::Error::PoolTimedOut)));
        orders
            .expect_mark_succeeded()
            .with(eq(healthy))
            .times(1)
            .returning(|_| Ok(()));

        let (queue, receiver) = FulfillmentQueue::bounded(4);
        let (_shutdown_tx, shutdown) = watch::channel(false);

        queue.publish(failing)?;
        queue.publish(healthy)?;
        drop(queue);

        FulfillmentWorker::new(Arc::new(orders), receiver, Duration::ZERO)
            .run(shutdown)
            .await;

        Ok(())
    }

    #[tokio::test]
    async fn shutdown_stops_before_taking_more_work() -> TestResult {
        let mut orders = MockOrdersService::new();

        orders.expect_mark_processing().never();
        orders.expect_mark_succeeded().never();

        let (queue, receiver) = FulfillmentQueue::bounded(4);
        let (shutdown_tx, shutdown) = watch::channel(false);

        queue.publish(OrderUuid::new())?;
        shutdown_tx.send(true)?;

        FulfillmentWorker::new(Arc::new(orders), receiver, Duration::ZERO)
            .run(shutdown)
            .await;

        Ok(())
    }

    #[tokio::test]
    async fn shutdown_signal_wakes_an_idle_worker() -> TestResult {
        let orders = MockOrdersService::new();
        let (_queue, receiver) = FulfillmentQueue::bounded(4);
        let (shutdown_tx, shutdown) = watch::channel(false);

        let handle =
            FulfillmentWorker::new(Arc::new(orders), receiver, Duration::ZERO).spawn(shutdown);

        shutdown_tx.send(true)?;

        tokio::time::timeout(Duration::from_secs(5), handle).await??;

        Ok(())
    }

    #[tokio::test]
    async fn committed_order_reaches_success() -> TestResult {
        let mut ctx = TestContext::new().await;
        let receiver = ctx.receiver.take().expect("receiver is taken once");
        let order = ctx.place_order(Decimal::new(1_999, 2), 1).await?;

        assert_eq!(order.status, OrderStatus::Pending);

        let (shutdown_tx, shutdown) = watch::channel(false);
        let worker = FulfillmentWorker::new(ctx.orders_service(), receiver, Duration::ZERO);
        let handle = worker.spawn(shutdown);

        let mut status = OrderStatus::Pending;

        for _ in 0..100 {
            status = ctx.orders.get_order(order.uuid).await?.status;

            if status == OrderStatus::Success {
                break;
            }

            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        shutdown_tx.send(true)?;
        handle.await?;

        assert_eq!(status, OrderStatus::Success);

        Ok(())
    }
}
