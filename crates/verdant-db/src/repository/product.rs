//! # Product Repository
//!
//! Catalog reads and stock writes. Implements the checkout
//! `ProductLookup` and `InventoryMutator` ports.
//!
//! ## Stock Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Every stock write is a single UPDATE evaluated by SQLite:          │
//! │                                                                     │
//! │  decrement:  UPDATE products SET stock = stock - :qty               │
//! │              WHERE id = :id AND stock >= :qty                       │
//! │              rows_affected == 0  ─►  StockConflict                  │
//! │                                                                     │
//! │  restock:    UPDATE products SET stock = stock + :qty               │
//! │              WHERE id = :id                                         │
//! │                                                                     │
//! │  No caller reads stock and writes back a computed value.            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;
use verdant_checkout::{CheckoutResult, InventoryMutator, ProductLookup};
use verdant_core::validation::{
    validate_price_cents, validate_product_name, validate_quantity, validate_sku,
};
use verdant_core::{CoreError, Product, ProductStatus};

use crate::error::{DbError, DbResult};

const PRODUCT_COLUMNS: &str =
    "id, sku, name, description, category, price_cents, currency, stock, status, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a catalog product after validating SKU, name and price.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        validate_sku(&product.sku).map_err(CoreError::from)?;
        validate_product_name(&product.name).map_err(CoreError::from)?;
        validate_price_cents(product.price_cents).map_err(CoreError::from)?;

        debug!(id = %product.id, sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, description, category,
                price_cents, currency, stock, status,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9,
                ?10, ?11
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.category)
        .bind(product.price_cents)
        .bind(&product.currency)
        .bind(product.stock)
        .bind(product.status)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &product.sku),
            other => other,
        })?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Bulk lookup in one query. Missing ids are simply absent from the
    /// result; order is unspecified.
    pub async fn find_by_ids(&self, ids: &[String]) -> DbResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        debug!(count = ids.len(), "Bulk product lookup");

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id IN ("));
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let products = qb.build_query_as::<Product>().fetch_all(&self.pool).await?;

        Ok(products)
    }

    /// Adds `quantity` units to stock.
    pub async fn restock(&self, id: &str, quantity: i64) -> DbResult<()> {
        validate_quantity(quantity).map_err(CoreError::from)?;

        debug!(id = %id, quantity, "Restocking product");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    pub async fn set_status(&self, id: &str, status: ProductStatus) -> DbResult<()> {
        debug!(id = %id, status = ?status, "Updating product status");

        let result = sqlx::query("UPDATE products SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Atomic conditional decrement on its own connection.
    pub async fn decrement_stock(&self, id: &str, quantity: i64) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        conditional_decrement(&mut *conn, id, quantity, Utc::now()).await
    }

    /// Counts catalog products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// "Subtract `quantity` if and only if stock >= `quantity`" as one UPDATE.
///
/// Runs on whatever connection it is given, so the order repository can
/// call it inside its placement transaction. A non-positive quantity is
/// refused before touching the row.
pub(crate) async fn conditional_decrement(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
    now: DateTime<Utc>,
) -> DbResult<()> {
    if validate_quantity(quantity).is_err() {
        return Err(CoreError::InvalidQuantity {
            product_id: product_id.to_string(),
            quantity,
        }
        .into());
    }

    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock = stock - ?2, updated_at = ?3
        WHERE id = ?1 AND stock >= ?2
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(());
    }

    let available: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

    match available {
        Some(available) => {
            debug!(
                product_id = %product_id,
                available,
                requested = quantity,
                "Conditional decrement refused"
            );
            Err(DbError::StockConflict {
                product_id: product_id.to_string(),
                available,
                requested: quantity,
            })
        }
        None => Err(CoreError::ProductNotFound(product_id.to_string()).into()),
    }
}

#[async_trait]
impl ProductLookup for ProductRepository {
    async fn find_products(&self, ids: &[String]) -> CheckoutResult<Vec<Product>> {
        self.find_by_ids(ids)
            .await
            .map_err(DbError::into_lookup_failure)
    }
}

#[async_trait]
impl InventoryMutator for ProductRepository {
    async fn commit_decrement(&self, product_id: &str, quantity: i64) -> CheckoutResult<()> {
        self.decrement_stock(product_id, quantity)
            .await
            .map_err(DbError::into_persistence_failure)
    }
}

/// Generates a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use verdant_checkout::CheckoutError;
    use verdant_core::ProductCategory;

    fn product(sku: &str, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: generate_product_id(),
            sku: sku.to_string(),
            name: "Terracotta Pot 20cm".to_string(),
            description: "Hand-thrown clay pot".to_string(),
            category: ProductCategory::Pots,
            price_cents: 3490,
            currency: "BRL".to_string(),
            stock,
            status: ProductStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        let p = product("POT-020", 12);

        repo.insert(&p).await.unwrap();
        let loaded = repo.get_by_id(&p.id).await.unwrap().unwrap();

        assert_eq!(loaded.sku, "POT-020");
        assert_eq!(loaded.category, ProductCategory::Pots);
        assert_eq!(loaded.status, ProductStatus::Active);
        assert_eq!(loaded.price().unwrap().to_string(), "BRL 34.90");
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_product() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let mut free = product("POT-FREE", 1);
        free.price_cents = 0;
        assert!(matches!(repo.insert(&free).await, Err(DbError::Rule(_))));

        repo.insert(&product("POT-DUP", 1)).await.unwrap();
        let err = repo.insert(&product("POT-DUP", 1)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if value == "POT-DUP"));
    }

    #[tokio::test]
    async fn test_find_by_ids_skips_missing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        let a = product("POT-A", 1);
        let b = product("POT-B", 1);
        repo.insert(&a).await.unwrap();
        repo.insert(&b).await.unwrap();

        let found = repo
            .find_by_ids(&[a.id.clone(), "nope".to_string(), b.id.clone()])
            .await
            .unwrap();

        assert_eq!(found.len(), 2);
        assert!(repo.find_by_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_conditional_decrement() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        let p = product("POT-DEC", 3);
        repo.insert(&p).await.unwrap();

        repo.commit_decrement(&p.id, 2).await.unwrap();
        let err = repo.commit_decrement(&p.id, 2).await.unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::StockCommitFailed { available: 1, requested: 2, .. }
        ));
        assert_eq!(repo.get_by_id(&p.id).await.unwrap().unwrap().stock, 1);

        let err = repo.commit_decrement("ghost", 1).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Rejected(CoreError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn test_negative_decrement_never_adds_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        let p = product("POT-NEG", 2);
        repo.insert(&p).await.unwrap();

        let err = repo.commit_decrement(&p.id, -5).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Rejected(CoreError::InvalidQuantity { quantity: -5, .. })
        ));

        let err = repo.decrement_stock(&p.id, 0).await.unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::InvalidQuantity { quantity: 0, .. })));

        assert_eq!(repo.get_by_id(&p.id).await.unwrap().unwrap().stock, 2);
    }

    #[tokio::test]
    async fn test_restock_and_status() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        let p = product("POT-RST", 0);
        repo.insert(&p).await.unwrap();

        repo.restock(&p.id, 5).await.unwrap();
        assert!(matches!(repo.restock(&p.id, 0).await, Err(DbError::Rule(_))));
        repo.set_status(&p.id, ProductStatus::Inactive).await.unwrap();

        let loaded = repo.get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(loaded.stock, 5);
        assert_eq!(loaded.status, ProductStatus::Inactive);
        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
