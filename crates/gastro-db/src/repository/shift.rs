//! # Shift Repository
//!
//! Shift documents are upserted on every change while the shift is open
//! (each sale and cash-out moves the totals) and once more at close.
//!
//! The `status` column mirrors `Shift::status` so the terminal can find the
//! open shift at startup without decoding the whole history.

use sqlx::SqlitePool;
use tracing::{debug, warn};

use super::{decode_rows, Record, RecordStore};
use crate::error::DbResult;
use gastro_core::{Shift, ShiftStatus};

impl Record for Shift {
    const TABLE: &'static str = "shifts";
    const ENTITY: &'static str = "Shift";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn sort_key(&self) -> String {
        self.start_time.to_rfc3339()
    }

    fn status(&self) -> Option<&'static str> {
        Some(self.status.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ShiftRecordRepository {
    store: RecordStore<Shift>,
}

impl ShiftRecordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ShiftRecordRepository {
            store: RecordStore::new(pool),
        }
    }

    pub async fn upsert(&self, shift: &Shift) -> DbResult<()> {
        debug!(
            shift_id = %shift.id,
            status = shift.status.as_str(),
            total_sales = shift.total_sales.cents(),
            "Saving shift"
        );
        self.store.upsert(shift).await
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Shift>> {
        self.store.get(id).await
    }

    /// The open shift, if any.
    ///
    /// More than one open row means two terminals wrote concurrently; the
    /// most recently started one wins and the rest are logged.
    pub async fn active(&self) -> DbResult<Option<Shift>> {
        let rows = sqlx::query(
            "SELECT payload FROM shifts WHERE status = ?1 ORDER BY sort_key DESC, id DESC",
        )
        .bind(ShiftStatus::Open)
        .fetch_all(self.store.pool())
        .await?;

        let mut open: Vec<Shift> = decode_rows(rows)?;
        if open.len() > 1 {
            warn!(
                count = open.len(),
                kept = %open[0].id,
                "Several open shifts stored; keeping the latest"
            );
        }

        Ok(if open.is_empty() {
            None
        } else {
            Some(open.swap_remove(0))
        })
    }

    /// Closed shifts, oldest first.
    pub async fn history(&self) -> DbResult<Vec<Shift>> {
        self.store.list_by_status(ShiftStatus::Closed.as_str()).await
    }
}
