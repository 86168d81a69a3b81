//! # Persistence Backend
//!
//! The opaque collaborator that mirrors terminal state. The terminal never
//! reads from it after startup; writes go through the [`Outbox`](crate::Outbox).
//!
//! ```text
//! ┌───────────────┬─────────────────────────┬────────────────────────────┐
//! │ Collection    │ Read (startup)          │ Write                      │
//! ├───────────────┼─────────────────────────┼────────────────────────────┤
//! │ ingredients   │ load_ingredients        │ upsert_ingredient          │
//! │ products      │ load_products           │ upsert_product             │
//! │ sales         │ load_sales              │ insert_sale      (append)  │
//! │ tax entries   │ load_tax_entries        │ insert_tax_entry (append)  │
//! │ waste         │ load_waste              │ insert_waste     (append)  │
//! │ shifts        │ load_active_shift       │ upsert_shift               │
//! │ users         │ load_users              │ (read only)                │
//! └───────────────┴─────────────────────────┴────────────────────────────┘
//! ```

use async_trait::async_trait;

use gastro_core::{Ingredient, Product, Sale, Shift, TaxEntry, User, WasteEntry};
use gastro_db::Database;

use crate::error::SyncResult;

#[async_trait]
pub trait PersistenceBackend: Send + Sync {
    async fn load_ingredients(&self) -> SyncResult<Vec<Ingredient>>;
    async fn upsert_ingredient(&self, ingredient: &Ingredient) -> SyncResult<()>;

    async fn load_products(&self) -> SyncResult<Vec<Product>>;
    async fn upsert_product(&self, product: &Product) -> SyncResult<()>;

    async fn load_sales(&self) -> SyncResult<Vec<Sale>>;
    async fn insert_sale(&self, sale: &Sale) -> SyncResult<()>;

    async fn load_tax_entries(&self) -> SyncResult<Vec<TaxEntry>>;
    async fn insert_tax_entry(&self, entry: &TaxEntry) -> SyncResult<()>;

    async fn load_waste(&self) -> SyncResult<Vec<WasteEntry>>;
    async fn insert_waste(&self, entry: &WasteEntry) -> SyncResult<()>;

    /// The shift left open by a previous session, if any.
    async fn load_active_shift(&self) -> SyncResult<Option<Shift>>;
    async fn upsert_shift(&self, shift: &Shift) -> SyncResult<()>;

    async fn load_users(&self) -> SyncResult<Vec<User>>;
}

// =============================================================================
// SQLite Implementation
// =============================================================================

#[async_trait]
impl PersistenceBackend for Database {
    async fn load_ingredients(&self) -> SyncResult<Vec<Ingredient>> {
        Ok(self.ingredients().list().await?)
    }

    async fn upsert_ingredient(&self, ingredient: &Ingredient) -> SyncResult<()> {
        Ok(self.ingredients().upsert(ingredient).await?)
    }

    async fn load_products(&self) -> SyncResult<Vec<Product>> {
        Ok(self.products().list().await?)
    }

    async fn upsert_product(&self, product: &Product) -> SyncResult<()> {
        Ok(self.products().upsert(product).await?)
    }

    async fn load_sales(&self) -> SyncResult<Vec<Sale>> {
        Ok(self.sales().list().await?)
    }

    async fn insert_sale(&self, sale: &Sale) -> SyncResult<()> {
        Ok(self.sales().insert(sale).await?)
    }

    async fn load_tax_entries(&self) -> SyncResult<Vec<TaxEntry>> {
        Ok(self.tax_entries().list().await?)
    }

    async fn insert_tax_entry(&self, entry: &TaxEntry) -> SyncResult<()> {
        Ok(self.tax_entries().insert(entry).await?)
    }

    async fn load_waste(&self) -> SyncResult<Vec<WasteEntry>> {
        Ok(self.waste().list().await?)
    }

    async fn insert_waste(&self, entry: &WasteEntry) -> SyncResult<()> {
        Ok(self.waste().insert(entry).await?)
    }

    async fn load_active_shift(&self) -> SyncResult<Option<Shift>> {
        Ok(self.shifts().active().await?)
    }

    async fn upsert_shift(&self, shift: &Shift) -> SyncResult<()> {
        Ok(self.shifts().upsert(shift).await?)
    }

    async fn load_users(&self) -> SyncResult<Vec<User>> {
        Ok(self.users().list().await?)
    }
}
