//! # Repository Module
//!
//! Every collection is a table of JSON documents. [`RecordStore`] holds the
//! SQL once; the typed repositories wrap it and add the lookups their
//! callers need.
//!
//! ## Write Semantics
//! ```text
//! ┌──────────────────────┬────────────────────────────────────────────────┐
//! │ Collection           │ Write                                          │
//! ├──────────────────────┼────────────────────────────────────────────────┤
//! │ ingredients          │ upsert (stock changes after every sale)        │
//! │ products             │ upsert (recipe / price edits)                  │
//! │ users, suppliers     │ upsert                                         │
//! │ shifts               │ upsert (totals mutate while open)              │
//! │ sales                │ insert-only                                    │
//! │ tax_entries          │ insert-only                                    │
//! │ waste_entries        │ insert-only                                    │
//! └──────────────────────┴────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`catalogue`] - Ingredients, products and suppliers
//! - [`staff`] - Users
//! - [`shift`] - Shift documents and the active-shift lookup
//! - [`ledger`] - Sales, tax entries and waste (insert-only)

pub mod catalogue;
pub mod ledger;
pub mod shift;
pub mod staff;

use std::marker::PhantomData;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::naming;

// =============================================================================
// Record
// =============================================================================

/// A document stored in its own table.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    /// Table name.
    const TABLE: &'static str;

    /// Entity name for error messages.
    const ENTITY: &'static str;

    fn record_id(&self) -> &str;

    /// Ordering column: a name, an RFC 3339 timestamp or an ISO date.
    fn sort_key(&self) -> String;

    /// Indexed status column, for collections that are queried by status.
    fn status(&self) -> Option<&'static str> {
        None
    }
}

// =============================================================================
// RecordStore
// =============================================================================

/// Generic document table access.
#[derive(Debug)]
pub struct RecordStore<T> {
    pool: SqlitePool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for RecordStore<T> {
    fn clone(&self) -> Self {
        RecordStore {
            pool: self.pool.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Record> RecordStore<T> {
    pub fn new(pool: SqlitePool) -> Self {
        RecordStore {
            pool,
            _marker: PhantomData,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Inserts or replaces the document with the record's id.
    pub async fn upsert(&self, record: &T) -> DbResult<()> {
        let payload = encode(record)?;
        let now = Utc::now().to_rfc3339();

        debug!(table = T::TABLE, id = %record.record_id(), "Upserting record");

        let sql = format!(
            "INSERT INTO {} (id, payload, sort_key, status, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?5) \
             ON CONFLICT(id) DO UPDATE SET \
                payload = excluded.payload, \
                sort_key = excluded.sort_key, \
                status = excluded.status, \
                updated_at = excluded.updated_at",
            T::TABLE
        );

        sqlx::query(&sql)
            .bind(record.record_id())
            .bind(payload)
            .bind(record.sort_key())
            .bind(record.status())
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Inserts a new document. An existing id is a
    /// [`DbError::UniqueViolation`]; nothing is overwritten.
    pub async fn insert(&self, record: &T) -> DbResult<()> {
        let payload = encode(record)?;
        let now = Utc::now().to_rfc3339();

        debug!(table = T::TABLE, id = %record.record_id(), "Inserting record");

        let sql = format!(
            "INSERT INTO {} (id, payload, sort_key, status, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            T::TABLE
        );

        sqlx::query(&sql)
            .bind(record.record_id())
            .bind(payload)
            .bind(record.sort_key())
            .bind(record.status())
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => {
                    DbError::duplicate(format!("{}.id", T::TABLE), record.record_id())
                }
                other => other,
            })?;

        Ok(())
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<T>> {
        let sql = format!("SELECT payload FROM {} WHERE id = ?1", T::TABLE);

        let payload: Option<String> = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        payload.map(|p| decode::<T>(&p)).transpose()
    }

    /// Like [`get`](Self::get) but a missing row is [`DbError::NotFound`].
    pub async fn require(&self, id: &str) -> DbResult<T> {
        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found(T::ENTITY, id))
    }

    /// All documents ordered by sort key, then id.
    pub async fn list(&self) -> DbResult<Vec<T>> {
        let sql = format!("SELECT payload FROM {} ORDER BY sort_key, id", T::TABLE);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        decode_rows(rows)
    }

    /// Documents whose status column equals `status`.
    pub async fn list_by_status(&self, status: &str) -> DbResult<Vec<T>> {
        let sql = format!(
            "SELECT payload FROM {} WHERE status = ?1 ORDER BY sort_key, id",
            T::TABLE
        );
        let rows = sqlx::query(&sql).bind(status).fetch_all(&self.pool).await?;
        decode_rows(rows)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", T::TABLE);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }
}

// =============================================================================
// Encoding
// =============================================================================

fn encode<T: Record>(record: &T) -> DbResult<String> {
    let value = serde_json::to_value(record).map_err(|e| DbError::malformed(T::ENTITY, e))?;
    serde_json::to_string(&naming::to_storage(value)).map_err(|e| DbError::malformed(T::ENTITY, e))
}

fn decode<T: Record>(payload: &str) -> DbResult<T> {
    let stored: serde_json::Value =
        serde_json::from_str(payload).map_err(|e| DbError::malformed(T::ENTITY, e))?;
    serde_json::from_value(naming::from_storage(stored)).map_err(|e| DbError::malformed(T::ENTITY, e))
}

pub(crate) fn decode_rows<T: Record>(rows: Vec<sqlx::sqlite::SqliteRow>) -> DbResult<Vec<T>> {
    rows.iter()
        .map(|row| {
            let payload: String = row.try_get("payload")?;
            decode::<T>(&payload)
        })
        .collect()
}
