//! # Catalogue Repositories
//!
//! Ingredients, products and suppliers. All three are upsert collections:
//! stock levels and recipes change in place and nothing is ever deleted.

use sqlx::SqlitePool;
use tracing::debug;

use super::{Record, RecordStore};
use crate::error::DbResult;
use gastro_core::{Ingredient, Product, Supplier};

impl Record for Ingredient {
    const TABLE: &'static str = "ingredients";
    const ENTITY: &'static str = "Ingredient";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn sort_key(&self) -> String {
        self.name.to_lowercase()
    }
}

impl Record for Product {
    const TABLE: &'static str = "products";
    const ENTITY: &'static str = "Product";

    fn record_id(&self) -> &str {
        &self.id
    }

    /// Products list grouped by category, then by name.
    fn sort_key(&self) -> String {
        format!("{}/{}", self.category.to_lowercase(), self.name.to_lowercase())
    }
}

impl Record for Supplier {
    const TABLE: &'static str = "suppliers";
    const ENTITY: &'static str = "Supplier";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn sort_key(&self) -> String {
        self.name.to_lowercase()
    }
}

// =============================================================================
// Ingredients
// =============================================================================

#[derive(Debug, Clone)]
pub struct IngredientRepository {
    store: RecordStore<Ingredient>,
}

impl IngredientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        IngredientRepository {
            store: RecordStore::new(pool),
        }
    }

    pub fn store(&self) -> &RecordStore<Ingredient> {
        &self.store
    }

    pub async fn list(&self) -> DbResult<Vec<Ingredient>> {
        self.store.list().await
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Ingredient>> {
        self.store.get(id).await
    }

    pub async fn upsert(&self, ingredient: &Ingredient) -> DbResult<()> {
        debug!(id = %ingredient.id, stock = ingredient.stock, "Saving ingredient");
        self.store.upsert(ingredient).await
    }

    /// Upserts every ingredient in one transaction (seeding, bulk stock
    /// corrections).
    pub async fn upsert_all(&self, ingredients: &[Ingredient]) -> DbResult<()> {
        let mut tx = self.store.pool().begin().await?;
        for ingredient in ingredients {
            upsert_in(&mut tx, ingredient).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Clone)]
pub struct ProductRepository {
    store: RecordStore<Product>,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository {
            store: RecordStore::new(pool),
        }
    }

    pub async fn list(&self) -> DbResult<Vec<Product>> {
        self.store.list().await
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Product>> {
        self.store.get(id).await
    }

    pub async fn upsert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, recipe_lines = product.recipe.len(), "Saving product");
        self.store.upsert(product).await
    }

    pub async fn upsert_all(&self, products: &[Product]) -> DbResult<()> {
        let mut tx = self.store.pool().begin().await?;
        for product in products {
            upsert_in(&mut tx, product).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

// =============================================================================
// Suppliers
// =============================================================================

#[derive(Debug, Clone)]
pub struct SupplierRepository {
    store: RecordStore<Supplier>,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository {
            store: RecordStore::new(pool),
        }
    }

    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        self.store.list().await
    }

    pub async fn upsert(&self, supplier: &Supplier) -> DbResult<()> {
        self.store.upsert(supplier).await
    }
}

async fn upsert_in<T: Record>(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    record: &T,
) -> DbResult<()> {
    let payload = super::encode(record)?;
    let now = chrono::Utc::now().to_rfc3339();
    let sql = format!(
        "INSERT INTO {} (id, payload, sort_key, status, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?5) \
         ON CONFLICT(id) DO UPDATE SET \
            payload = excluded.payload, \
            sort_key = excluded.sort_key, \
            updated_at = excluded.updated_at",
        T::TABLE
    );

    sqlx::query(&sql)
        .bind(record.record_id())
        .bind(payload)
        .bind(record.sort_key())
        .bind(record.status())
        .bind(now)
        .execute(&mut **tx)
        .await?;

    Ok(())
}
