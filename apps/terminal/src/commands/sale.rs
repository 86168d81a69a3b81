//! # Sale Commands
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  complete_sale                                                          │
//! │                                                                         │
//! │  1. validate lines + payment                                            │
//! │  2. stamp: id, tenant, timestamp, open shift, seller                    │
//! │  3. resolve stock (Reject policy may stop here, nothing changed yet)    │
//! │  4. shift totals ─┐                                                     │
//! │                   ├─► batch "complete_sale": [shift, sale]              │
//! │  5. append sale ──┘      (shift first: the sale references it)          │
//! │  6. ingredients ─────► batch "sale_stock": touched ingredients          │
//! │  7. release the table                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use gastro_core::stock::{self, ConsumptionEvent};
use gastro_core::validation::{validate_lines, validate_payment};
use gastro_core::{CoreError, Money, PaymentMethod, Sale, SaleLine, Shift};
use gastro_sync::{OutboundWrite, WriteBatch};

use crate::error::{ApiError, ApiResult};
use crate::state::Terminal;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteSaleRequest {
    pub items: Vec<SaleLine>,
    pub payment_method: PaymentMethod,
    /// Cash handed over; drives the change.
    #[serde(default)]
    pub amount_paid: Option<Money>,
    #[serde(default)]
    pub table_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteSaleResponse {
    pub sale: Sale,
    /// The open shift after this sale, if there is one.
    pub shift: Option<Shift>,
    /// Ingredients at or below minimum after the decrement.
    pub low_stock: Vec<String>,
    pub sale_batch: Option<u64>,
    pub stock_batch: Option<u64>,
}

pub fn complete_sale(
    terminal: &mut Terminal,
    request: CompleteSaleRequest,
) -> ApiResult<CompleteSaleResponse> {
    let seller_id = terminal.acting_user_id()?;
    validate_lines(&request.items).map_err(CoreError::from)?;

    let total = Sale::items_total(&request.items);
    validate_payment(total, request.payment_method, request.amount_paid)?;

    if let Some(table_id) = &request.table_id {
        if terminal.floor.get(table_id).is_none() {
            return Err(ApiError::not_found("Table", table_id));
        }
    }

    let now = Utc::now();
    let sale = Sale {
        id: sale_id(now),
        timestamp: now,
        items: request.items,
        total,
        amount_paid: request.amount_paid,
        change: request.amount_paid.map(|paid| Sale::change_due(total, paid)),
        payment_method: request.payment_method,
        seller_id,
        table_id: request.table_id,
        tenant_id: terminal.tenant.id.clone(),
        shift_id: terminal.shifts.get_open().map(|s| s.id.clone()),
    };

    let consumption = terminal.propagator.apply(
        &terminal.products,
        &terminal.ingredients,
        &ConsumptionEvent::from_sale(&sale),
    )?;

    let shift = terminal.shifts.record_sale(&sale);
    let mut batch = WriteBatch::new("complete_sale");
    if let Some(shift) = &shift {
        batch.push(OutboundWrite::UpsertShift(shift.clone()));
    }
    batch.push(OutboundWrite::InsertSale(sale.clone()));
    let sale_batch = terminal.dispatch(batch);
    terminal.sales.push(sale.clone());

    let mut stock_writes = WriteBatch::new("sale_stock");
    stock_writes.extend(terminal.commit_consumption(consumption, "sale"));
    let stock_batch = terminal.dispatch(stock_writes);

    if let Some(table_id) = &sale.table_id {
        terminal.floor.release(table_id, now)?;
    }

    info!(
        sale_id = %sale.id,
        total = %sale.total,
        method = ?sale.payment_method,
        shift_id = ?sale.shift_id,
        table_id = ?sale.table_id,
        "Sale completed"
    );

    Ok(CompleteSaleResponse {
        low_stock: stock::low_stock(&terminal.ingredients)
            .into_iter()
            .map(|i| i.id.clone())
            .collect(),
        sale,
        shift,
        sale_batch,
        stock_batch,
    })
}

/// `v-<millis>-<random>`: sortable by time, unique within a millisecond.
fn sale_id(now: DateTime<Utc>) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("v-{}-{}", now.timestamp_millis(), &random[..6])
}
