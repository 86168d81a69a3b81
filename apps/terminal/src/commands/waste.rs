//! # Waste Commands
//!
//! Product that leaves the bar without a ticket still consumes its recipe.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use gastro_core::validation::validate_stock_quantity;
use gastro_core::{ConsumptionEvent, CoreError, WasteEntry, WasteReason};
use gastro_sync::{OutboundWrite, WriteBatch};

use crate::error::ApiResult;
use crate::state::Terminal;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterWasteRequest {
    pub product_id: String,
    pub quantity: f64,
    pub reason: WasteReason,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WasteResponse {
    pub entry: WasteEntry,
    /// Ingredients whose stock went down.
    pub touched: Vec<String>,
    pub batch_id: Option<u64>,
}

pub fn register_waste(
    terminal: &mut Terminal,
    request: RegisterWasteRequest,
) -> ApiResult<WasteResponse> {
    let user_id = terminal.acting_user_id()?;
    validate_stock_quantity("quantity", request.quantity).map_err(CoreError::from)?;

    let entry = WasteEntry {
        id: format!("w-{}", Uuid::new_v4().simple()),
        timestamp: Utc::now(),
        product_id: request.product_id,
        quantity: request.quantity,
        reason: request.reason,
        user_id,
        note: request.note.filter(|n| !n.trim().is_empty()),
    };

    let consumption = terminal.propagator.apply(
        &terminal.products,
        &terminal.ingredients,
        &[ConsumptionEvent::from(&entry)],
    )?;
    let touched = consumption.touched.clone();

    let mut batch = WriteBatch::new("register_waste").then(OutboundWrite::InsertWaste(entry.clone()));
    batch.extend(terminal.commit_consumption(consumption, "waste"));
    let batch_id = terminal.dispatch(batch);

    info!(
        waste_id = %entry.id,
        product_id = %entry.product_id,
        quantity = entry.quantity,
        reason = ?entry.reason,
        "Waste registered"
    );
    terminal.waste.push(entry.clone());

    Ok(WasteResponse {
        entry,
        touched,
        batch_id,
    })
}
