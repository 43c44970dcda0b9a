//! In-process cart store.

use std::time::Duration;

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tokio::{sync::RwLock, time::Instant};

use crate::domain::{
    buyers::BuyerUuid,
    carts::{
        errors::CartStoreError,
        records::CartEntry,
        store::{CartStore, validate_entries},
    },
};

#[derive(Debug)]
struct StoredCart {
    entries: Vec<CartEntry>,
    /// `None` when the TTL reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl StoredCart {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|expires_at| expires_at > now)
    }
}

/// Cart store held in process memory. Carts do not survive a restart.
#[derive(Debug)]
pub struct InMemoryCartStore {
    ttl: Duration,
    carts: RwLock<FxHashMap<BuyerUuid, StoredCart>>,
}

impl InMemoryCartStore {
    /// Creates an empty store whose carts expire `ttl` after their last write.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            carts: RwLock::new(FxHashMap::default()),
        }
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn get(&self, buyer: BuyerUuid) -> Result<Vec<CartEntry>, CartStoreError> {
        let carts = self.carts.read().await;

        Ok(carts
            .get(&buyer)
            .filter(|cart| cart.is_live(Instant::now()))
            .map(|cart| cart.entries.clone())
            .unwrap_or_default())
    }

    async fn set(&self, buyer: BuyerUuid, entries: Vec<CartEntry>) -> Result<(), CartStoreError> {
        validate_entries(&entries)?;

        let mut carts = self.carts.write().await;
        let now = Instant::now();

        carts.retain(|_, cart| cart.is_live(now));
        carts.insert(
            buyer,
            StoredCart {
                entries,
                expires_at: now.checked_add(self.ttl),
            },
        );

        Ok(())
    }

    async fn clear(&self, buyer: BuyerUuid) -> Result<(), CartStoreError> {
        self.carts.write().await.remove(&buyer);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::domain::products::records::ProductUuid;

    use super::*;

    #[tokio::test]
    async fn set_then_get_returns_entries() -> TestResult {
        let store = InMemoryCartStore::new(Duration::from_secs(60));
        let buyer = BuyerUuid::new();
        let entry = CartEntry::new(ProductUuid::new(), 3);

        store.set(buyer, vec![entry]).await?;

        assert_eq!(store.get(buyer).await?, vec![entry]);

        Ok(())
    }

    #[tokio::test]
    async fn unbounded_ttl_keeps_the_cart() -> TestResult {
        let store = InMemoryCartStore::new(Duration::MAX);
        let buyer = BuyerUuid::new();
        let entry = CartEntry::new(ProductUuid::new(), 1);

        store.set(buyer, vec![entry]).await?;

        assert_eq!(store.get(buyer).await?, vec![entry]);

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn cart_expires_after_ttl() -> TestResult {
        let store = InMemoryCartStore::new(Duration::from_secs(60));
        let buyer = BuyerUuid::new();

        store
            .set(buyer, vec![CartEntry::new(ProductUuid::new(), 1)])
            .await?;

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(store.get(buyer).await?.len(), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(store.get(buyer).await?.is_empty());

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn set_refreshes_expiry() -> TestResult {
        let store = InMemoryCartStore::new(Duration::from_secs(60));
        let buyer = BuyerUuid::new();
        let entry = CartEntry::new(ProductUuid::new(), 1);

        store.set(buyer, vec![entry]).await?;
        tokio::time::advance(Duration::from_secs(45)).await;
        store.set(buyer, vec![entry]).await?;
        tokio::time::advance(Duration::from_secs(45)).await;

        assert_eq!(store.get(buyer).await?, vec![entry]);

        Ok(())
    }

    #[tokio::test]
    async fn clear_removes_cart() -> TestResult {
        let store = InMemoryCartStore::new(Duration::from_secs(60));
        let buyer = BuyerUuid::new();

        store
            .set(buyer, vec![CartEntry::new(ProductUuid::new(), 1)])
            .await?;
        store.clear(buyer).await?;

        assert!(store.get(buyer).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected() {
        let store = InMemoryCartStore::new(Duration::from_secs(60));

        let result = store
            .set(BuyerUuid::new(), vec![CartEntry::new(ProductUuid::new(), 0)])
            .await;

        assert!(
            matches!(result, Err(CartStoreError::InvalidQuantity { .. })),
            "expected InvalidQuantity, got {result:?}"
        );
    }
}
