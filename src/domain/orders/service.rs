//! Orders service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;

use crate::{
    database::Db,
    domain::{
        buyers::BuyerUuid,
        orders::{
            errors::OrdersServiceError,
            records::{OrderRecord, OrderStatus, OrderUuid},
            repository::PgOrdersRepository,
        },
    },
};

#[derive(Debug, Clone)]
/// `PostgreSQL`-backed order reads and status transitions.
pub struct PgOrdersService {
    db: Db,
    repository: PgOrdersRepository,
}

impl PgOrdersService {
    #[must_use]
    /// Creates a new service over `db`.
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgOrdersRepository::new(),
        }
    }

    async fn transition(
        &self,
        order: OrderUuid,
        to: OrderStatus,
    ) -> Result<(), OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let rows_affected = self.repository.transition_status(&mut tx, order, to).await?;

        if rows_affected == 0 {
            return if self.repository.order_exists(&mut tx, order).await? {
                Err(OrdersServiceError::InvalidTransition { to })
            } else {
                Err(OrdersServiceError::NotFound)
            };
        }

        tx.commit().await?;

        Ok(())
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    async fn get_order(&self, order: OrderUuid) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let order = self.repository.get_order(&mut tx, order).await?;

        tx.commit().await?;

        Ok(order)
    }

    async fn list_orders(&self, buyer: BuyerUuid) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let orders = self.repository.list_buyer_orders(&mut tx, buyer).await?;

        tx.commit().await?;

        Ok(orders)
    }

    async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<OrderRecord>, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let order = self.repository.find_by_idempotency_key(&mut tx, key).await?;

        tx.commit().await?;

        Ok(order)
    }

    async fn mark_processing(&self, order: OrderUuid) -> Result<(), OrdersServiceError> {
        self.transition(order, OrderStatus::Processing).await
    }

    async fn mark_succeeded(&self, order: OrderUuid) -> Result<(), OrdersServiceError> {
        self.transition(order, OrderStatus::Success).await
    }

    async fn mark_failed(&self, order: OrderUuid) -> Result<(), OrdersServiceError> {
        self.transition(order, OrderStatus::Failed).await
    }

    async fn list_stale_pending(
        &self,
        placed_before: Timestamp,
    ) -> Result<Vec<OrderUuid>, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let orders = self
            .repository
            .list_stale_pending(&mut tx, placed_before)
            .await?;

        tx.commit().await?;

        Ok(orders)
    }
}

#[automock]
#[async_trait]
/// Order reads and lifecycle transitions.
///
/// Orders are only ever created by checkout.
pub trait OrdersService: Send + Sync {
    /// Retrieve a single order with its items.
    async fn get_order(&self, order: OrderUuid) -> Result<OrderRecord, OrdersServiceError>;

    /// A buyer's orders with their items, newest first.
    async fn list_orders(&self, buyer: BuyerUuid) -> Result<Vec<OrderRecord>, OrdersServiceError>;

    /// Look up the order placed with an idempotency key, if any.
    async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<OrderRecord>, OrdersServiceError>;

    /// Move a `PENDING` order to `PROCESSING`.
    async fn mark_processing(&self, order: OrderUuid) -> Result<(), OrdersServiceError>;

    /// Move a `PENDING` or `PROCESSING` order to `SUCCESS`.
    async fn mark_succeeded(&self, order: OrderUuid) -> Result<(), OrdersServiceError>;

    /// Move a `PENDING` or `PROCESSING` order to `FAILED`.
    async fn mark_failed(&self, order: OrderUuid) -> Result<(), OrdersServiceError>;

    /// `PENDING` orders placed before `placed_before`, oldest first.
    async fn list_stale_pending(
        &self,
        placed_before: Timestamp,
    ) -> Result<Vec<OrderUuid>, OrdersServiceError>;
}
