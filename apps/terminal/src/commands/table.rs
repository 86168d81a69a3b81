//! # Table Commands
//!
//! Thin wrappers over [`TableFloor`](gastro_core::TableFloor) that add the
//! acting user and the "no tables without a drawer" rule.

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};

use gastro_core::validation::{validate_price, validate_quantity};
use gastro_core::{CoreError, OrderLine, Table, TableLog, TableZone};

use crate::error::ApiResult;
use crate::state::Terminal;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenTableRequest {
    pub table_id: String,
    #[serde(default)]
    pub temp_name: Option<String>,
}

pub fn list_tables(terminal: &Terminal, zone: Option<TableZone>) -> Vec<Table> {
    match zone {
        Some(zone) => terminal.floor.by_zone(zone).cloned().collect(),
        None => terminal.floor.tables().to_vec(),
    }
}

/// Seats customers. Needs an open shift.
pub fn open_table(terminal: &mut Terminal, request: OpenTableRequest) -> ApiResult<Table> {
    if terminal.shifts.get_open().is_none() {
        return Err(CoreError::NoOpenShift.into());
    }
    let user_id = terminal.acting_user_id()?;
    let table = terminal
        .floor
        .open(&request.table_id, request.temp_name, &user_id, Utc::now())?
        .clone();

    info!(table_id = %table.id, user_id = %user_id, "Table opened");
    Ok(table)
}

/// Replaces the running order of a seated table. Free tables must go
/// through [`open_table`] first.
pub fn save_table_order(
    terminal: &mut Terminal,
    table_id: &str,
    lines: Vec<OrderLine>,
) -> ApiResult<Table> {
    for line in &lines {
        validate_quantity(line.quantity).map_err(CoreError::from)?;
        validate_price(line.unit_price).map_err(CoreError::from)?;
    }
    let user_id = terminal.acting_user_id()?;
    let table = terminal
        .floor
        .save_order(table_id, lines, &user_id, Utc::now())?
        .clone();

    debug!(table_id, lines = table.current_order.len(), total = %table.order_total(), "Order saved");
    Ok(table)
}

pub fn request_bill(terminal: &mut Terminal, table_id: &str) -> ApiResult<Table> {
    let table = terminal.floor.request_bill(table_id, Utc::now())?.clone();
    info!(table_id, total = %table.order_total(), "Bill requested");
    Ok(table)
}

/// Moves the order, name and status of `from_id` to the free table `to_id`.
pub fn move_table(terminal: &mut Terminal, from_id: &str, to_id: &str) -> ApiResult<()> {
    let user_id = terminal.acting_user_id()?;
    terminal.floor.move_order(from_id, to_id, &user_id, Utc::now())?;
    info!(from_id, to_id, user_id = %user_id, "Table moved");
    Ok(())
}

pub fn rename_table(
    terminal: &mut Terminal,
    table_id: &str,
    temp_name: Option<String>,
) -> ApiResult<Table> {
    let user_id = terminal.acting_user_id()?;
    Ok(terminal
        .floor
        .rename(table_id, temp_name, &user_id, Utc::now())?
        .clone())
}

/// Frees a table without charging it (customers left, order cancelled).
pub fn release_table(terminal: &mut Terminal, table_id: &str) -> ApiResult<Table> {
    let table = terminal.floor.release(table_id, Utc::now())?.clone();
    info!(table_id, "Table released");
    Ok(table)
}

pub fn table_log(terminal: &Terminal) -> Vec<TableLog> {
    terminal.floor.log().to_vec()
}
