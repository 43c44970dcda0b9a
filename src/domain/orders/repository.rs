//! Orders Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use rust_decimal::Decimal;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use uuid::Uuid;

use crate::{
    database::{quantity_param, try_get_u32},
    domain::{
        buyers::BuyerUuid,
        orders::{
            data::{NewOrder, NewOrderItem},
            records::{OrderItemRecord, OrderItemUuid, OrderRecord, OrderStatus, OrderUuid},
        },
        products::records::ProductUuid,
    },
};

const CREATE_ORDER_SQL: &str = include_str!("sql/create_order.sql");
const CREATE_ORDER_ITEM_SQL: &str = include_str!("sql/create_order_item.sql");
const GET_ORDER_SQL: &str = include_str!("sql/get_order.sql");
const FIND_ORDER_BY_IDEMPOTENCY_KEY_SQL: &str =
    include_str!("sql/find_order_by_idempotency_key.sql");
const LIST_BUYER_ORDERS_SQL: &str = include_str!("sql/list_buyer_orders.sql");
const GET_ORDER_ITEMS_SQL: &str = include_str!("sql/get_order_items.sql");
const TRANSITION_ORDER_STATUS_SQL: &str = include_str!("sql/transition_order_status.sql");
const ORDER_EXISTS_SQL: &str = include_str!("sql/order_exists.sql");
const LIST_STALE_PENDING_ORDERS_SQL: &str = include_str!("sql/list_stale_pending_orders.sql");
const LOCK_IDEMPOTENCY_KEY_SQL: &str = include_str!("sql/lock_idempotency_key.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Insert a `PENDING` order row. Items are inserted separately.
    pub(crate) async fn create_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: NewOrder,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(CREATE_ORDER_SQL)
            .bind(order.uuid.into_uuid())
            .bind(order.buyer.into_uuid())
            .bind(order.total)
            .bind(SqlxTimestamp::from(order.placed_at))
            .bind(order.idempotency_key)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn create_order_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        items: Vec<NewOrderItem>,
    ) -> Result<Vec<OrderItemRecord>, sqlx::Error> {
        let mut created = Vec::with_capacity(items.len());

        for item in items {
            let record = query_as::<Postgres, OrderItemRecord>(CREATE_ORDER_ITEM_SQL)
                .bind(item.uuid.into_uuid())
                .bind(order.into_uuid())
                .bind(item.product.into_uuid())
                .bind(quantity_param(item.quantity)?)
                .bind(item.price_at_purchase)
                .fetch_one(&mut **tx)
                .await?;

            created.push(record);
        }

        Ok(created)
    }

    pub(crate) async fn get_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<OrderRecord, sqlx::Error> {
        let mut record = query_as::<Postgres, OrderRecord>(GET_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        record.items = self.get_order_items(tx, &[order]).await?;

        Ok(record)
    }

    /// Serialize transactions that use the same idempotency key.
    ///
    /// The advisory lock is released when `tx` commits or rolls back.
    pub(crate) async fn lock_idempotency_key(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        key: &str,
    ) -> Result<(), sqlx::Error> {
        query(LOCK_IDEMPOTENCY_KEY_SQL)
            .bind(key)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn find_by_idempotency_key(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        key: &str,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        let Some(mut record) = query_as::<Postgres, OrderRecord>(FIND_ORDER_BY_IDEMPOTENCY_KEY_SQL)
            .bind(key)
            .fetch_optional(&mut **tx)
            .await?
        else {
            return Ok(None);
        };

        record.items = self.get_order_items(tx, &[record.uuid]).await?;

        Ok(Some(record))
    }

    pub(crate) async fn list_buyer_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        buyer: BuyerUuid,
    ) -> Result<Vec<OrderRecord>, sqlx::Error> {
        let mut orders = query_as::<Postgres, OrderRecord>(LIST_BUYER_ORDERS_SQL)
            .bind(buyer.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        let uuids: Vec<OrderUuid> = orders.iter().map(|order| order.uuid).collect();
        let items = self.get_order_items(tx, &uuids).await?;

        for order in &mut orders {
            order.items = items
                .iter()
                .filter(|item| item.order == order.uuid)
                .cloned()
                .collect();
        }

        Ok(orders)
    }

    async fn get_order_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        orders: &[OrderUuid],
    ) -> Result<Vec<OrderItemRecord>, sqlx::Error> {
        let uuids: Vec<Uuid> = orders.iter().map(|uuid| uuid.into_uuid()).collect();

        query_as::<Postgres, OrderItemRecord>(GET_ORDER_ITEMS_SQL)
            .bind(uuids)
            .fetch_all(&mut **tx)
            .await
    }

    /// Move `order` to `to` if its current status is one of `to`'s predecessors.
    /// Returns the number of rows updated.
    pub(crate) async fn transition_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        to: OrderStatus,
    ) -> Result<u64, sqlx::Error> {
        let from: Vec<&str> = to.predecessors().iter().map(|s| s.as_str()).collect();

        let rows_affected = query(TRANSITION_ORDER_STATUS_SQL)
            .bind(order.into_uuid())
            .bind(to.as_str())
            .bind(from)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn order_exists(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<bool, sqlx::Error> {
        query_scalar::<Postgres, bool>(ORDER_EXISTS_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_stale_pending(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        placed_before: Timestamp,
    ) -> Result<Vec<OrderUuid>, sqlx::Error> {
        let uuids = query_scalar::<Postgres, Uuid>(LIST_STALE_PENDING_ORDERS_SQL)
            .bind(SqlxTimestamp::from(placed_before))
            .fetch_all(&mut **tx)
            .await?;

        Ok(uuids.into_iter().map(OrderUuid::from_uuid).collect())
    }
}

impl<'r> FromRow<'r, PgRow> for OrderRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("status")?;

        let status = status
            .parse::<OrderStatus>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            uuid: OrderUuid::from_uuid(row.try_get("uuid")?),
            buyer: BuyerUuid::from_uuid(row.try_get("buyer_uuid")?),
            total: row.try_get::<Decimal, _>("total")?,
            status,
            placed_at: row.try_get::<SqlxTimestamp, _>("placed_at")?.to_jiff(),
            idempotency_key: row.try_get("idempotency_key")?,
            items: Vec::new(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for OrderItemRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: OrderItemUuid::from_uuid(row.try_get("uuid")?),
            order: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            product: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            quantity: try_get_u32(row, "quantity")?,
            price_at_purchase: row.try_get::<Decimal, _>("price_at_purchase")?,
        })
    }
}
