//! # Table Floor
//!
//! Tables, their running orders, and the audit log of who did what.
//!
//! ## Table States
//! ```text
//!            open(name)              request_bill()
//!   ┌──────┐ ─────────► ┌──────────┐ ─────────────► ┌──────────────────┐
//!   │ Free │            │ Occupied │                │ AwaitingPayment  │
//!   └──────┘ ◄───────── └──────────┘ ◄───────────── └──────────────────┘
//!      ▲      release()       │        save_order()          │
//!      │                      │                              │
//!      └──────────────────────┴───────── release() ──────────┘
//!
//!   move_order(from, to): `to` must be Free. The order, name and status
//!   travel to `to`; `from` ends Free and empty.
//! ```

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{OrderLine, Table, TableAction, TableLog, TableStatus, TableZone};

/// Oldest entries are dropped past this point.
pub const MAX_LOG_ENTRIES: usize = 500;

#[derive(Debug, Clone, Default)]
pub struct TableFloor {
    tables: Vec<Table>,
    log: Vec<TableLog>,
}

impl TableFloor {
    pub fn new(tables: Vec<Table>) -> Self {
        Self {
            tables,
            log: Vec::new(),
        }
    }

    /// The standard café layout: four tables inside, three on the terrace,
    /// three stools at the bar.
    pub fn default_layout() -> Self {
        let mut tables = Vec::with_capacity(10);
        for n in 1..=4 {
            tables.push(Table::new(format!("t{n}"), n.to_string(), TableZone::Indoor));
        }
        for n in 1..=3 {
            tables.push(Table::new(format!("t1{}", n - 1), format!("T{n}"), TableZone::Terrace));
        }
        for n in 1..=3 {
            tables.push(Table::new(format!("b{n}"), format!("B{n}"), TableZone::Bar));
        }
        Self::new(tables)
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn get(&self, table_id: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.id == table_id)
    }

    pub fn by_zone(&self, zone: TableZone) -> impl Iterator<Item = &Table> + '_ {
        self.tables.iter().filter(move |t| t.zone == zone)
    }

    pub fn occupied_count(&self) -> usize {
        self.tables.iter().filter(|t| !t.is_free()).count()
    }

    /// Audit trail, oldest first.
    pub fn log(&self) -> &[TableLog] {
        &self.log
    }

    /// Seats customers at a free table.
    ///
    /// ## Errors
    /// [`CoreError::TableNotFree`] if the table already has an order.
    pub fn open(
        &mut self,
        table_id: &str,
        temp_name: Option<String>,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<&Table> {
        let pos = self.position(table_id)?;
        let table = &mut self.tables[pos];
        if !table.is_free() {
            return Err(CoreError::TableNotFree {
                table_id: table_id.to_string(),
            });
        }
        table.status = TableStatus::Occupied;
        table.temp_name = normalize_name(temp_name);
        table.current_order.clear();
        table.last_activity = Some(now);

        let details = match &table.temp_name {
            Some(name) => format!("Opened table {} for {}", table.number, name),
            None => format!("Opened table {}", table.number),
        };
        self.push_log(user_id, TableAction::Open, details, now);
        Ok(&self.tables[pos])
    }

    /// Replaces the running order of a seated table.
    ///
    /// ## Errors
    /// [`CoreError::TableNotOccupied`] if nobody is seated there; tables are
    /// only seated through [`TableFloor::open`].
    pub fn save_order(
        &mut self,
        table_id: &str,
        lines: Vec<OrderLine>,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<&Table> {
        let pos = self.position(table_id)?;
        let table = &mut self.tables[pos];
        if table.is_free() {
            return Err(CoreError::TableNotOccupied {
                table_id: table_id.to_string(),
            });
        }
        table.current_order = lines;
        table.last_activity = Some(now);

        let details = format!(
            "Saved {} line(s) on table {} ({})",
            table.current_order.len(),
            table.number,
            table.order_total()
        );
        self.push_log(user_id, TableAction::Save, details, now);
        Ok(&self.tables[pos])
    }

    /// Marks the table as waiting for payment.
    pub fn request_bill(&mut self, table_id: &str, now: DateTime<Utc>) -> CoreResult<&Table> {
        let pos = self.position(table_id)?;
        let table = &mut self.tables[pos];
        if table.is_free() {
            return Err(CoreError::TableNotOccupied {
                table_id: table_id.to_string(),
            });
        }
        table.status = TableStatus::AwaitingPayment;
        table.last_activity = Some(now);
        Ok(&self.tables[pos])
    }

    /// Moves a running order to another table.
    ///
    /// ## Errors
    /// - [`CoreError::TableNotOccupied`] when `from_id` has nothing to move
    /// - [`CoreError::TableNotFree`] when `to_id` already has customers
    pub fn move_order(
        &mut self,
        from_id: &str,
        to_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        if from_id == to_id {
            return Err(ValidationError::InvalidFormat {
                field: "to_id".to_string(),
                reason: "destination is the same table".to_string(),
            }
            .into());
        }
        let from = self.position(from_id)?;
        let to = self.position(to_id)?;
        if self.tables[from].is_free() {
            return Err(CoreError::TableNotOccupied {
                table_id: from_id.to_string(),
            });
        }
        if !self.tables[to].is_free() {
            return Err(CoreError::TableNotFree {
                table_id: to_id.to_string(),
            });
        }

        let source = &mut self.tables[from];
        let order = std::mem::take(&mut source.current_order);
        let name = source.temp_name.take();
        let status = std::mem::replace(&mut source.status, TableStatus::Free);
        source.last_activity = Some(now);
        let from_number = source.number.clone();

        let dest = &mut self.tables[to];
        dest.current_order = order;
        dest.temp_name = name;
        dest.status = status;
        dest.last_activity = Some(now);
        let details = format!("Moved table {} to {}", from_number, dest.number);

        self.push_log(user_id, TableAction::Move, details, now);
        Ok(())
    }

    /// Frees the table: order emptied, name cleared.
    pub fn release(&mut self, table_id: &str, now: DateTime<Utc>) -> CoreResult<&Table> {
        let pos = self.position(table_id)?;
        let table = &mut self.tables[pos];
        table.status = TableStatus::Free;
        table.current_order.clear();
        table.temp_name = None;
        table.last_activity = Some(now);
        Ok(&self.tables[pos])
    }

    /// Sets the nickname shown on the floor plan. Blank clears it.
    pub fn rename(
        &mut self,
        table_id: &str,
        temp_name: Option<String>,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<&Table> {
        let pos = self.position(table_id)?;
        let table = &mut self.tables[pos];
        table.temp_name = normalize_name(temp_name);
        table.last_activity = Some(now);

        let details = format!(
            "Renamed table {} to {}",
            table.number,
            table.temp_name.as_deref().unwrap_or("-")
        );
        self.push_log(user_id, TableAction::Rename, details, now);
        Ok(&self.tables[pos])
    }

    fn position(&self, table_id: &str) -> CoreResult<usize> {
        self.tables
            .iter()
            .position(|t| t.id == table_id)
            .ok_or_else(|| CoreError::TableNotFound(table_id.to_string()))
    }

    /// Hands the log over, e.g. to persist it, and starts a fresh one.
    pub fn drain_log(&mut self) -> Vec<TableLog> {
        std::mem::take(&mut self.log)
    }

    fn push_log(&mut self, user_id: &str, action: TableAction, details: String, now: DateTime<Utc>) {
        if self.log.len() >= MAX_LOG_ENTRIES {
            let excess = self.log.len() + 1 - MAX_LOG_ENTRIES;
            self.log.drain(..excess);
        }
        self.log.push(TableLog {
            id: Uuid::new_v4().to_string(),
            timestamp: now,
            user_id: user_id.to_string(),
            action,
            details,
        });
    }
}

fn normalize_name(name: Option<String>) -> Option<String> {
    name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

// =============================================================================
// Unit Tests
// =============================================================================
