//! Test context for service-level integration tests.

use std::{sync::Arc, time::Duration};

use rust_decimal::Decimal;
use testresult::TestResult;
use tokio::sync::mpsc::Receiver;

use crate::{
    database::Db,
    domain::{
        buyers::BuyerUuid,
        carts::{CartStore, CartStoreError, PgCartStore, StoreCartsService, records::CartEntry},
        checkout::{CheckoutService, PgCheckoutService},
        fulfillment::{DEFAULT_QUEUE_CAPACITY, FulfillmentQueue},
        orders::{
            OrdersService, PgOrdersService,
            records::{OrderRecord, OrderUuid},
        },
        products::{
            PgProductsService, ProductsService, ProductsServiceError,
            data::NewProduct,
            records::{ProductRecord, ProductUuid},
        },
    },
};

use super::db::TestDb;

pub(crate) struct TestContext {
    pub db: TestDb,
    pub products: PgProductsService,
    pub orders: PgOrdersService,
    pub carts: StoreCartsService,
    pub cart_store: Arc<PgCartStore>,
    pub checkout: PgCheckoutService,
    pub queue: FulfillmentQueue,
    /// Consumer half of `queue`; take it to run a worker against this context.
    pub receiver: Option<Receiver<OrderUuid>>,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_queue_capacity(DEFAULT_QUEUE_CAPACITY).await
    }

    pub async fn with_queue_capacity(capacity: usize) -> Self {
        let test_db = TestDb::new().await;
        let db = Db::new(test_db.pool().clone());

        let cart_store = Arc::new(PgCartStore::new(
            test_db.pool().clone(),
            Duration::from_secs(60),
        ));
        let (queue, receiver) = FulfillmentQueue::bounded(capacity);

        Self {
            products: PgProductsService::new(db.clone()),
            orders: PgOrdersService::new(db.clone()),
            carts: StoreCartsService::new(cart_store.clone()),
            checkout: PgCheckoutService::new(db, cart_store.clone(), Arc::new(queue.clone())),
            cart_store,
            queue,
            receiver: Some(receiver),
            db: test_db,
        }
    }

    /// A fresh handle on the test database, for services built by the test itself.
    pub fn app_db(&self) -> Db {
        Db::new(self.db.pool().clone())
    }

    pub fn orders_service(&self) -> Arc<dyn OrdersService> {
        Arc::new(self.orders.clone())
    }

    pub async fn create_product(
        &self,
        price: Decimal,
        stock: u64,
    ) -> Result<ProductRecord, ProductsServiceError> {
        self.products
            .create_product(NewProduct {
                uuid: ProductUuid::new(),
                price,
                stock,
            })
            .await
    }

    /// Replace the buyer's cart with `lines`.
    pub async fn fill_cart(
        &self,
        buyer: BuyerUuid,
        lines: &[(ProductUuid, u32)],
    ) -> Result<(), CartStoreError> {
        let entries = lines
            .iter()
            .map(|&(product, quantity)| CartEntry::new(product, quantity))
            .collect();

        self.cart_store.set(buyer, entries).await
    }

    /// Check out `quantity` units of a new product for a new buyer.
    pub async fn place_order(&self, price: Decimal, quantity: u32) -> TestResult<OrderRecord> {
        let buyer = BuyerUuid::new();
        let product = self.create_product(price, u64::from(quantity)).await?;

        self.fill_cart(buyer, &[(product.uuid, quantity)]).await?;

        Ok(self.checkout.checkout(buyer, None).await?)
    }
}
