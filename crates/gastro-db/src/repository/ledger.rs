//! # Ledger Repositories
//!
//! Sales, tax entries and waste entries. These collections are append-only:
//! a record is inserted once and never updated. Re-inserting an id fails
//! with [`DbError::UniqueViolation`](crate::DbError::UniqueViolation).
//!
//! ```text
//! complete_sale ──► shifts.upsert ──► sales.insert
//!                        (shift first, the sale references it)
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use super::{decode_rows, Record, RecordStore};
use crate::error::DbResult;
use gastro_core::{Sale, TaxEntry, WasteEntry};

impl Record for Sale {
    const TABLE: &'static str = "sales";
    const ENTITY: &'static str = "Sale";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn sort_key(&self) -> String {
        self.timestamp.to_rfc3339()
    }
}

impl Record for TaxEntry {
    const TABLE: &'static str = "tax_entries";
    const ENTITY: &'static str = "TaxEntry";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn sort_key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

impl Record for WasteEntry {
    const TABLE: &'static str = "waste_entries";
    const ENTITY: &'static str = "WasteEntry";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn sort_key(&self) -> String {
        self.timestamp.to_rfc3339()
    }
}

// =============================================================================
// Sales
// =============================================================================

#[derive(Debug, Clone)]
pub struct SaleRepository {
    store: RecordStore<Sale>,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository {
            store: RecordStore::new(pool),
        }
    }

    pub async fn insert(&self, sale: &Sale) -> DbResult<()> {
        debug!(
            sale_id = %sale.id,
            total = sale.total.cents(),
            shift_id = ?sale.shift_id,
            "Inserting sale"
        );
        self.store.insert(sale).await
    }

    /// All sales, oldest first.
    pub async fn list(&self) -> DbResult<Vec<Sale>> {
        self.store.list().await
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Sale>> {
        self.store.get(id).await
    }

    /// Sales stamped with `shift_id`, oldest first.
    pub async fn for_shift(&self, shift_id: &str) -> DbResult<Vec<Sale>> {
        let rows = sqlx::query(
            "SELECT payload FROM sales \
             WHERE json_extract(payload, '$.shift_id') = ?1 \
             ORDER BY sort_key, id",
        )
        .bind(shift_id)
        .fetch_all(self.store.pool())
        .await?;

        decode_rows(rows)
    }

    pub async fn count(&self) -> DbResult<i64> {
        self.store.count().await
    }
}

// =============================================================================
// Tax Entries
// =============================================================================

#[derive(Debug, Clone)]
pub struct TaxEntryRepository {
    store: RecordStore<TaxEntry>,
}

impl TaxEntryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TaxEntryRepository {
            store: RecordStore::new(pool),
        }
    }

    pub async fn insert(&self, entry: &TaxEntry) -> DbResult<()> {
        debug!(entry_id = %entry.id, kind = ?entry.kind, total = entry.total.cents(), "Inserting tax entry");
        self.store.insert(entry).await
    }

    /// All entries, by date.
    pub async fn list(&self) -> DbResult<Vec<TaxEntry>> {
        self.store.list().await
    }
}

// =============================================================================
// Waste
// =============================================================================

#[derive(Debug, Clone)]
pub struct WasteRepository {
    store: RecordStore<WasteEntry>,
}

impl WasteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        WasteRepository {
            store: RecordStore::new(pool),
        }
    }

    pub async fn insert(&self, entry: &WasteEntry) -> DbResult<()> {
        debug!(entry_id = %entry.id, product_id = %entry.product_id, "Inserting waste entry");
        self.store.insert(entry).await
    }

    pub async fn list(&self) -> DbResult<Vec<WasteEntry>> {
        self.store.list().await
    }
}
