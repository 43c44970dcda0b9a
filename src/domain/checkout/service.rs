//! Checkout service.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::{debug, info, instrument, warn};

use crate::{
    database::Db,
    domain::{
        buyers::BuyerUuid,
        carts::CartStore,
        checkout::{
            errors::CheckoutError,
            lines::{CheckoutLines, PricedLine},
            totals::order_total,
        },
        fulfillment::OrderPublisher,
        orders::{
            OrdersServiceError,
            data::{NewOrder, NewOrderItem},
            records::{OrderItemUuid, OrderRecord, OrderUuid},
            repository::PgOrdersRepository,
        },
        products::repository::PgProductsRepository,
    },
};

/// Converts a buyer's cart into a committed order.
///
/// Stock rows are locked, validated, decremented and the order written in one
/// transaction. The cart is cleared and the order published only after commit,
/// and neither of those steps can undo a committed order.
pub struct PgCheckoutService {
    db: Db,
    carts: Arc<dyn CartStore>,
    publisher: Arc<dyn OrderPublisher>,
    products: PgProductsRepository,
    orders: PgOrdersRepository,
}

impl PgCheckoutService {
    /// Creates a new service.
    #[must_use]
    pub fn new(db: Db, carts: Arc<dyn CartStore>, publisher: Arc<dyn OrderPublisher>) -> Self {
        Self {
            db,
            carts,
            publisher,
            products: PgProductsRepository::new(),
            orders: PgOrdersRepository::new(),
        }
    }

    async fn cart_lines(&self, buyer: BuyerUuid) -> Result<CheckoutLines, CheckoutError> {
        let entries = self
            .carts
            .get(buyer)
            .await
            .map_err(CheckoutError::CartUnavailable)?;

        CheckoutLines::from_entries(&entries)
    }

    /// Place the order in one transaction, or return the order `key` already names.
    ///
    /// Transactions sharing a key hold an advisory lock for their whole
    /// duration, so a retry that arrives while the first submission is still
    /// running waits for it and then replays its order.
    async fn place_order(
        &self,
        buyer: BuyerUuid,
        lines: Result<CheckoutLines, CheckoutError>,
        idempotency_key: Option<String>,
    ) -> Result<Placement, CheckoutError> {
        let mut tx = self.db.begin_transaction().await?;

        if let Some(key) = idempotency_key.as_deref() {
            self.orders.lock_idempotency_key(&mut tx, key).await?;

            let existing = self
                .orders
                .find_by_idempotency_key(&mut tx, key)
                .await
                .map_err(lookup_error)?;

            match existing {
                Some(order) if order.buyer != buyer => {
                    return Err(CheckoutError::IdempotencyConflict);
                }
                Some(order) => return Ok(Placement::Replayed(order)),
                None => {}
            }
        }

        let lines = lines?;
        let ledger = self.products.lock_stock(&mut tx, &lines.products()).await?;
        let priced = lines.price(&ledger)?;
        let total = order_total(priced.iter().map(|line| (line.quantity, line.unit_price)));

        let mut order = self
            .orders
            .create_order(
                &mut tx,
                NewOrder {
                    uuid: OrderUuid::new(),
                    buyer,
                    total,
                    placed_at: Timestamp::now(),
                    idempotency_key,
                },
            )
            .await?;

        let items = priced.iter().map(new_item).collect();

        order.items = self
            .orders
            .create_order_items(&mut tx, order.uuid, items)
            .await?;
        order.items.sort_by_key(|item| item.uuid);

        for line in &priced {
            let rows_affected = self
                .products
                .decrement_stock(&mut tx, line.product, line.quantity)
                .await?;

            if rows_affected == 0 {
                return Err(CheckoutError::StockRace {
                    product: line.product,
                });
            }
        }

        tx.commit().await?;

        Ok(Placement::Placed(order))
    }

    async fn finish(&self, order: &OrderRecord) {
        if let Err(error) = self.carts.clear(order.buyer).await {
            warn!(order = %order.uuid, "failed to clear cart after checkout: {error}");
        }

        if let Err(error) = self.publisher.publish(order.uuid) {
            warn!(order = %order.uuid, "order left pending for reconciliation: {error}");
        }
    }
}

#[async_trait]
impl CheckoutService for PgCheckoutService {
    #[instrument(skip(self, idempotency_key), fields(buyer = %buyer))]
    async fn checkout(
        &self,
        buyer: BuyerUuid,
        idempotency_key: Option<String>,
    ) -> Result<OrderRecord, CheckoutError> {
        if buyer.is_nil() {
            return Err(CheckoutError::Unauthorized);
        }

        let key = idempotency_key.filter(|key| !key.trim().is_empty());

        // With a key, cart errors wait until the key has been looked up.
        let lines = match (self.cart_lines(buyer).await, &key) {
            (Err(error), None) => return Err(error),
            (lines, _) => lines,
        };

        let order = match self.place_order(buyer, lines, key).await? {
            Placement::Placed(order) => order,
            Placement::Replayed(order) => {
                debug!(order = %order.uuid, "returning order already placed with this key");
                return Ok(order);
            }
        };

        info!(order = %order.uuid, total = %order.total, "order placed");

        self.finish(&order).await;

        Ok(order)
    }
}

#[automock]
#[async_trait]
/// Cart-to-order conversion.
pub trait CheckoutService: Send + Sync {
    /// Place an order for everything in the buyer's cart.
    ///
    /// With an idempotency key, repeated calls by the same buyer return the
    /// order created by the first successful call and change nothing else.
    async fn checkout(
        &self,
        buyer: BuyerUuid,
        idempotency_key: Option<String>,
    ) -> Result<OrderRecord, CheckoutError>;
}

enum Placement {
    Placed(OrderRecord),
    Replayed(OrderRecord),
}

fn new_item(line: &PricedLine) -> NewOrderItem {
    NewOrderItem {
        uuid: OrderItemUuid::new(),
        product: line.product,
        quantity: line.quantity,
        price_at_purchase: line.unit_price,
    }
}

fn lookup_error(error: sqlx::Error) -> CheckoutError {
    CheckoutError::OrderLookup(OrdersServiceError::from(error))
}
