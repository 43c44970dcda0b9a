//! Carts Repository

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, query, query_scalar, types::Json};
use tracing::debug;

use crate::domain::{
    buyers::BuyerUuid,
    carts::{
        errors::CartStoreError,
        records::CartEntry,
        store::{CartStore, validate_entries},
    },
};

const GET_CART_SQL: &str = include_str!("sql/get_cart.sql");
const SET_CART_SQL: &str = include_str!("sql/set_cart.sql");
const CLEAR_CART_SQL: &str = include_str!("sql/clear_cart.sql");
const PURGE_EXPIRED_CARTS_SQL: &str = include_str!("sql/purge_expired_carts.sql");

#[derive(Debug, Clone)]
/// Cart store backed by an unlogged `PostgreSQL` table, one JSON document per buyer.
pub struct PgCartStore {
    pool: PgPool,
    ttl: Duration,
}

impl PgCartStore {
    /// Creates a store whose carts expire `ttl` after their last write.
    #[must_use]
    pub fn new(pool: PgPool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }

    /// Delete every expired cart, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`CartStoreError::Unavailable`] when the store cannot be reached.
    pub async fn purge_expired(&self) -> Result<u64, CartStoreError> {
        let rows_affected = query(PURGE_EXPIRED_CARTS_SQL)
            .execute(&self.pool)
            .await?
            .rows_affected();

        debug!(purged = rows_affected, "purged expired carts");

        Ok(rows_affected)
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn get(&self, buyer: BuyerUuid) -> Result<Vec<CartEntry>, CartStoreError> {
        let entries = query_scalar::<Postgres, Json<Vec<CartEntry>>>(GET_CART_SQL)
            .bind(buyer.into_uuid())
            .fetch_optional(&self.pool)
            .await?;

        Ok(entries.map(|Json(entries)| entries).unwrap_or_default())
    }

    async fn set(&self, buyer: BuyerUuid, entries: Vec<CartEntry>) -> Result<(), CartStoreError> {
        validate_entries(&entries)?;

        query(SET_CART_SQL)
            .bind(buyer.into_uuid())
            .bind(Json(entries))
            .bind(self.ttl.as_secs_f64())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn clear(&self, buyer: BuyerUuid) -> Result<(), CartStoreError> {
        query(CLEAR_CART_SQL)
            .bind(buyer.into_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
