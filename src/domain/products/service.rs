//! Products service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::products::{
        data::NewProduct,
        errors::ProductsServiceError,
        records::{ProductRecord, ProductUuid},
        repository::PgProductsRepository,
    },
};

#[derive(Debug, Clone)]
/// `PostgreSQL`-backed stock ledger operations.
pub struct PgProductsService {
    db: Db,
    repository: PgProductsRepository,
}

impl PgProductsService {
    #[must_use]
    /// Creates a new service over `db`.
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgProductsRepository::new(),
        }
    }
}

#[async_trait]
impl ProductsService for PgProductsService {
    async fn create_product(
        &self,
        product: NewProduct,
    ) -> Result<ProductRecord, ProductsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let created = self.repository.create_product(&mut tx, product).await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn get_product(
        &self,
        product: ProductUuid,
    ) -> Result<ProductRecord, ProductsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let product = self.repository.get_product(&mut tx, product).await?;

        tx.commit().await?;

        Ok(product)
    }

    async fn restock(
        &self,
        product: ProductUuid,
        quantity: u64,
    ) -> Result<ProductRecord, ProductsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let product = self.repository.restock(&mut tx, product, quantity).await?;

        tx.commit().await?;

        Ok(product)
    }
}

#[automock]
#[async_trait]
/// Stock ledger seeding and reads.
pub trait ProductsService: Send + Sync {
    /// Creates a new product with the given price and opening stock.
    async fn create_product(
        &self,
        product: NewProduct,
    ) -> Result<ProductRecord, ProductsServiceError>;

    /// Retrieve a single product.
    async fn get_product(
        &self,
        product: ProductUuid,
    ) -> Result<ProductRecord, ProductsServiceError>;

    /// Adds `quantity` units to a product's stock.
    async fn restock(
        &self,
        product: ProductUuid,
        quantity: u64,
    ) -> Result<ProductRecord, ProductsServiceError>;
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::test::TestContext;

    use super::*;

    #[tokio::test]
    async fn create_product_returns_price_and_stock() -> TestResult {
        let ctx = TestContext::new().await;
        let uuid = ProductUuid::new();

        let product = ctx
            .products
            .create_product(NewProduct {
                uuid,
                price: Decimal::new(9_995, 3),
                stock: 4,
            })
            .await?;

        assert_eq!(product.uuid, uuid);
        assert_eq!(product.price, Decimal::new(9_995, 3));
        assert_eq!(product.stock, 4);

        Ok(())
    }

    #[tokio::test]
    async fn get_product_unknown_uuid_returns_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx.products.get_product(ProductUuid::new()).await;

        assert!(
            matches!(result, Err(ProductsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn create_product_duplicate_uuid_returns_already_exists() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(Decimal::ONE, 1).await?;

        let result = ctx
            .products
            .create_product(NewProduct {
                uuid: product.uuid,
                price: Decimal::ONE,
                stock: 1,
            })
            .await;

        assert!(
            matches!(result, Err(ProductsServiceError::AlreadyExists)),
            "expected AlreadyExists, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn create_product_negative_price_returns_invalid_data() {
        let ctx = TestContext::new().await;

        let result = ctx
            .products
            .create_product(NewProduct {
                uuid: ProductUuid::new(),
                price: Decimal::NEGATIVE_ONE,
                stock: 1,
            })
            .await;

        assert!(
            matches!(result, Err(ProductsServiceError::InvalidData)),
            "expected InvalidData, got {result:?}"
        );
    }

    #[tokio::test]
    async fn restock_adds_to_existing_stock() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(Decimal::TEN, 2).await?;

        let restocked = ctx.products.restock(product.uuid, 5).await?;

        assert_eq!(restocked.stock, 7);
        assert_eq!(ctx.products.get_product(product.uuid).await?.stock, 7);

        Ok(())
    }

    #[tokio::test]
    async fn restock_unknown_product_returns_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx.products.restock(ProductUuid::new(), 1).await;

        assert!(
            matches!(result, Err(ProductsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }
}
