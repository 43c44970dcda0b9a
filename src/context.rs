//! App Context

use std::{sync::Arc, time::Duration};

use sqlx::migrate::MigrateError;
use thiserror::Error;

use crate::{
    database::{self, Db},
    domain::{
        carts::{CartsService, DEFAULT_CART_TTL_SECS, PgCartStore, StoreCartsService},
        checkout::{CheckoutService, PgCheckoutService},
        fulfillment::{
            DEFAULT_FULFILLMENT_DELAY, DEFAULT_QUEUE_CAPACITY, FulfillmentQueue, FulfillmentWorker,
        },
        orders::{OrdersService, PgOrdersService},
        products::{PgProductsService, ProductsService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to apply database migrations")]
    Migrate(#[source] MigrateError),
}

/// Runtime knobs for building an [`AppContext`].
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub database_url: String,
    pub cart_ttl: Duration,
    pub queue_capacity: usize,
    pub fulfillment_delay: Duration,
}

impl AppSettings {
    /// Settings with every knob at its default.
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            cart_ttl: Duration::from_secs(DEFAULT_CART_TTL_SECS),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            fulfillment_delay: DEFAULT_FULFILLMENT_DELAY,
        }
    }
}

#[derive(Clone)]
pub struct AppContext {
    pub products: Arc<dyn ProductsService>,
    pub orders: Arc<dyn OrdersService>,
    pub carts: Arc<dyn CartsService>,
    pub checkout: Arc<dyn CheckoutService>,
    pub queue: FulfillmentQueue,
    pub cart_store: Arc<PgCartStore>,
}

impl AppContext {
    /// Connect, migrate and wire every service.
    ///
    /// The returned worker owns the consumer half of the fulfillment queue.
    /// Dropping it closes the queue, after which checkouts leave their orders
    /// `PENDING` for a later reconciliation sweep.
    ///
    /// # Errors
    ///
    /// Returns an error when the database cannot be reached or migrated.
    pub async fn from_settings(
        settings: &AppSettings,
    ) -> Result<(Self, FulfillmentWorker), AppInitError> {
        let pool = database::connect(&settings.database_url)
            .await
            .map_err(AppInitError::Database)?;

        database::migrate(&pool)
            .await
            .map_err(AppInitError::Migrate)?;

        let db = Db::new(pool.clone());

        let cart_store = Arc::new(PgCartStore::new(pool, settings.cart_ttl));
        let (queue, receiver) = FulfillmentQueue::bounded(settings.queue_capacity);
        let orders: Arc<dyn OrdersService> = Arc::new(PgOrdersService::new(db.clone()));

        let worker = FulfillmentWorker::new(orders.clone(), receiver, settings.fulfillment_delay);

        let context = Self {
            products: Arc::new(PgProductsService::new(db.clone())),
            carts: Arc::new(StoreCartsService::new(cart_store.clone())),
            checkout: Arc::new(PgCheckoutService::new(
                db,
                cart_store.clone(),
                Arc::new(queue.clone()),
            )),
            orders,
            queue,
            cart_store,
        };

        Ok((context, worker))
    }
}
