//! Fulfillment queue.

use std::{sync::Arc, time::Duration};

use jiff::{SignedDuration, Timestamp};
use mockall::automock;
use tokio::{
    sync::{
        mpsc::{self, Receiver, Sender, error::TrySendError},
        watch,
    },
    time::MissedTickBehavior,
};
use tracing::{info, warn};

use crate::domain::{
    fulfillment::errors::FulfillmentError,
    orders::{OrdersService, records::OrderUuid},
};

/// Default number of order ids buffered between checkout and the worker.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

#[automock]
/// Hands committed orders to fulfillment.
pub trait OrderPublisher: Send + Sync {
    /// Enqueue `order` without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`FulfillmentError::QueueFull`] or [`FulfillmentError::QueueClosed`]
    /// when the id was dropped instead of enqueued.
    fn publish(&self, order: OrderUuid) -> Result<(), FulfillmentError>;
}

/// Bounded in-process FIFO of order ids, shared by any number of producers and
/// drained by one [`FulfillmentWorker`](super::FulfillmentWorker).
///
/// Publishing never blocks: ids that do not fit are dropped and left `PENDING`
/// until [`FulfillmentQueue::reconcile`] picks them up again.
#[derive(Debug, Clone)]
pub struct FulfillmentQueue {
    sender: Sender<OrderUuid>,
}

impl FulfillmentQueue {
    /// Create a queue holding at most `capacity` ids, returning the consumer half.
    #[must_use]
    pub fn bounded(capacity: usize) -> (Self, Receiver<OrderUuid>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));

        (Self { sender }, receiver)
    }

    /// Republish every `PENDING` order placed before `placed_before`.
    ///
    /// Stops at the first id the queue refuses. Returns how many ids were enqueued.
    ///
    /// # Errors
    ///
    /// Returns [`FulfillmentError::Orders`] when pending orders cannot be listed.
    pub async fn reconcile(
        &self,
        orders: &dyn OrdersService,
        placed_before: Timestamp,
    ) -> Result<usize, FulfillmentError> {
        let stale = orders.list_stale_pending(placed_before).await?;
        let found = stale.len();
        let mut published = 0;

        for order in stale {
            if let Err(error) = self.publish(order) {
                warn!(remaining = found - published, "reconciliation stopped: {error}");
                break;
            }

            published += 1;
        }

        if found > 0 {
            info!(found, published, "requeued stale pending orders");
        }

        Ok(published)
    }

    /// Run [`FulfillmentQueue::reconcile`] every `period` until `shutdown`
    /// flips to `true` or its sender is dropped.
    ///
    /// Each sweep requeues `PENDING` orders older than `pending_after`. The
    /// first sweep runs immediately.
    pub async fn reconcile_periodically(
        &self,
        orders: Arc<dyn OrdersService>,
        period: Duration,
        pending_after: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticks = tokio::time::interval(period.max(Duration::from_millis(1)));

        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while !*shutdown.borrow() {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }

                _ = ticks.tick() => {
                    let cutoff = stale_cutoff(pending_after);

                    if let Err(error) = self.reconcile(orders.as_ref(), cutoff).await {
                        warn!("reconciliation sweep failed: {error}");
                    }
                }
            }
        }
    }
}

/// The instant before which a `PENDING` order has been waiting longer than `age`.
///
/// Saturates at [`Timestamp::MIN`] when `age` reaches past it.
#[must_use]
pub fn stale_cutoff(age: Duration) -> Timestamp {
    SignedDuration::try_from(age)
        .ok()
        .and_then(|age| Timestamp::now().checked_sub(age).ok())
        .unwrap_or(Timestamp::MIN)
}

impl OrderPublisher for FulfillmentQueue {
    fn publish(&self, order: OrderUuid) -> Result<(), FulfillmentError> {
        self.sender.try_send(order).map_err(|error| match error {
            TrySendError::Full(order) => FulfillmentError::QueueFull(order),
            TrySendError::Closed(order) => FulfillmentError::QueueClosed(order),
        })
    }
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;
    use mockall::predicate::always;
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::{
        domain::{
            buyers::BuyerUuid,
            checkout::{CheckoutService, PgCheckoutService},
            fulfillment::FulfillmentWorker,
            orders::{MockOrdersService, OrdersService, OrdersServiceError, records::OrderStatus},
        },
        test::TestContext,
    };

    use super::*;

    #[tokio::test]
    async fn delivers_in_fifo_order() -> TestResult {
        let (queue, mut receiver) = FulfillmentQueue::bounded(4);
        let first = OrderUuid::new();
        let second = OrderUuid::new();

        queue.publish(first)?;
        queue.publish(second)?;

        assert_eq!(receiver.recv().await, Some(first));
        assert_eq!(receiver.recv().await, Some(second));

        Ok(())
    }

    #[test]
    fn full_queue_drops_without_blocking() -> TestResult {
        let (queue, _receiver) = FulfillmentQueue::bounded(1);
        let kept = OrderUuid::new();
        let dropped = OrderUuid::new();

        queue.publish(kept)?;

        let result = queue.publish(dropped);

        assert!(
            matches!(result, Err(FulfillmentError::QueueFull(order)) if order == dropped),
            "expected QueueFull, got {result:?}"
        );

        Ok(())
    }

    #[test]
    fn closed_queue_reports_closed() {
        let (queue, receiver) = FulfillmentQueue::bounded(1);

        drop(receiver);

        let result = queue.publish(OrderUuid::new());

        assert!(
            matches!(result, Err(FulfillmentError::QueueClosed(_))),
            "expected QueueClosed, got {result:?}"
        );
    }

    #[tokio::test]
    async fn reconcile_requeues_until_full() -> TestResult {
        let (queue, mut receiver) = FulfillmentQueue::bounded(2);
        let stale = vec![OrderUuid::new(), OrderUuid::new(), OrderUuid::new()];
        let listed = stale.clone();

        let mut orders = MockOrdersService::new();

        orders
            .expect_list_stale_pending()
            .with(always())
            .times(1)
            .returning(move |_| Ok(listed.clone()));

        let published = queue.reconcile(&orders, Timestamp::now()).await?;

        assert_eq!(published, 2);
        assert_eq!(receiver.recv().await, stale.first().copied());
        assert_eq!(receiver.recv().await, stale.get(1).copied());
        assert!(receiver.try_recv().is_err(), "third order should have been dropped");

        Ok(())
    }

    #[tokio::test]
    async fn reconcile_surfaces_listing_failure() {
        let (queue, _receiver) = FulfillmentQueue::bounded(2);
        let mut orders = MockOrdersService::new();

        orders
            .expect_list_stale_pending()
            .returning(|_| Err(OrdersServiceError::Sql(sqlx::Error::PoolTimedOut)));

        let result = queue.reconcile(&orders, Timestamp::now()).await;

        assert!(
            matches!(result, Err(FulfillmentError::Orders(_))),
            "expected Orders error, got {result:?}"
        );
    }

    #[tokio::test]
    async fn reconcile_republishes_orders_left_pending() -> TestResult {
        let mut ctx = TestContext::new().await;
        let mut receiver = ctx.receiver.take().expect("receiver is taken once");
        let order = ctx.place_order(Decimal::ONE, 1).await?;

        // the first delivery is lost
        assert_eq!(receiver.recv().await, Some(order.uuid));

        let cutoff = Timestamp::now() + SignedDuration::from_secs(1);
        let published = ctx.queue.reconcile(&ctx.orders, cutoff).await?;

        assert_eq!(published, 1);
        assert_eq!(receiver.recv().await, Some(order.uuid));

        Ok(())
    }

    #[test]
    fn stale_cutoff_saturates_for_huge_ages() {
        assert_eq!(stale_cutoff(Duration::MAX), Timestamp::MIN);
        assert!(stale_cutoff(Duration::from_secs(60)) < Timestamp::now());
    }

    #[tokio::test]
    async fn periodic_sweep_stops_on_shutdown() {
        let (queue, _receiver) = FulfillmentQueue::bounded(2);
        let mut orders = MockOrdersService::new();

        orders
            .expect_list_stale_pending()
            .returning(|_| Ok(Vec::new()));

        let (shutdown_tx, shutdown) = watch::channel(false);
        let orders: Arc<dyn OrdersService> = Arc::new(orders);

        let sweep = tokio::spawn(async move {
            queue
                .reconcile_periodically(orders, Duration::from_millis(10), Duration::ZERO, shutdown)
                .await;
        });

        shutdown_tx.send_replace(true);

        let stopped = tokio::time::timeout(Duration::from_secs(5), sweep).await;

        assert!(matches!(stopped, Ok(Ok(()))), "sweep did not stop: {stopped:?}");
    }

    #[tokio::test]
    async fn order_placed_while_worker_runs_is_swept_to_success() -> TestResult {
        let mut ctx = TestContext::new().await;
        let receiver = ctx.receiver.take().expect("receiver is taken once");
        let (shutdown_tx, shutdown) = watch::channel(false);

        let worker = FulfillmentWorker::new(ctx.orders_service(), receiver, Duration::ZERO)
            .spawn(shutdown.clone());

        let queue = ctx.queue.clone();
        let orders = ctx.orders_service();
        let sweep = tokio::spawn(async move {
            queue
                .reconcile_periodically(orders, Duration::from_millis(20), Duration::ZERO, shutdown)
                .await;
        });

        // placed by a process whose own queue has no consumer
        let mut publisher = MockOrderPublisher::new();

        publisher
            .expect_publish()
            .times(1)
            .returning(|order| Err(FulfillmentError::QueueClosed(order)));

        let checkout =
            PgCheckoutService::new(ctx.app_db(), ctx.cart_store.clone(), Arc::new(publisher));
        let buyer = BuyerUuid::new();
        let product = ctx.create_product(Decimal::ONE, 1).await?;

        ctx.fill_cart(buyer, &[(product.uuid, 1)]).await?;

        let order = checkout.checkout(buyer, None).await?;
        let mut status = OrderStatus::Pending;

        for _ in 0..250 {
            status = ctx.orders.get_order(order.uuid).await?.status;

            if status == OrderStatus::Success {
                break;
            }

            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        shutdown_tx.send(true)?;
        worker.await?;
        sweep.await?;

        assert_eq!(status, OrderStatus::Success);

        Ok(())
    }
}
