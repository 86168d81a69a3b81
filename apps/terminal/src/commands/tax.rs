//! # Tax Commands
//!
//! Manual expenses and the quarterly report (Modelo 303 / Modelo 130).
//! Sale income is never stored as an entry; it is derived from the tickets
//! every time the report is built.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use gastro_core::tax::{ledger_entries, TaxFilter, TaxTotals};
use gastro_core::validation::validate_name;
use gastro_core::{CoreError, Money, Shift, TaxEntry, TaxRate, ValidationError};
use gastro_sync::{OutboundWrite, WriteBatch};

use crate::error::ApiResult;
use crate::state::Terminal;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterExpenseRequest {
    pub concept: String,
    /// VAT included.
    pub total: Money,
    /// Defaults to the general rate (21 %).
    #[serde(default)]
    pub tax_rate_bps: Option<u32>,
    /// Defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Paid with cash from the drawer.
    #[serde(default)]
    pub is_cash_out: bool,
    #[serde(default)]
    pub attachment_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseResponse {
    pub entry: TaxEntry,
    /// The open shift, when the expense came out of its drawer.
    pub shift: Option<Shift>,
    pub batch_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxReport {
    pub entries: Vec<TaxEntry>,
    pub totals: TaxTotals,
    pub net_result: Money,
    /// Modelo 303.
    pub vat_settlement: Money,
    /// Modelo 130.
    pub income_tax_instalment: Money,
}

pub fn register_expense(
    terminal: &mut Terminal,
    request: RegisterExpenseRequest,
) -> ApiResult<ExpenseResponse> {
    validate_name("concept", &request.concept).map_err(CoreError::from)?;
    if !request.total.is_positive() {
        return Err(CoreError::from(ValidationError::MustBePositive {
            field: "total".to_string(),
        })
        .into());
    }
    let rate = match request.tax_rate_bps {
        Some(bps) if bps > 10_000 => {
            return Err(CoreError::from(ValidationError::OutOfRange {
                field: "tax_rate_bps".to_string(),
                min: 0,
                max: 10_000,
            })
            .into())
        }
        Some(bps) => TaxRate::from_bps(bps),
        None => TaxRate::GENERAL,
    };
    let date = request.date.unwrap_or_else(|| Utc::now().date_naive());

    let mut entry = TaxEntry::expense(request.concept, request.total, rate, date, request.is_cash_out);
    if let Some(url) = request.attachment_url {
        entry = entry.with_attachment(url);
    }

    let shift = terminal.shifts.record_cash_out(&entry);
    let mut batch = WriteBatch::new("register_expense").then(OutboundWrite::InsertTaxEntry(entry.clone()));
    if let Some(shift) = &shift {
        batch.push(OutboundWrite::UpsertShift(shift.clone()));
    }
    let batch_id = terminal.dispatch(batch);

    info!(
        entry_id = %entry.id,
        concept = %entry.concept,
        total = %entry.total,
        cash_out = entry.is_cash_out,
        shift_id = ?shift.as_ref().map(|s| &s.id),
        "Expense registered"
    );
    terminal.tax_entries.push(entry.clone());

    Ok(ExpenseResponse {
        entry,
        shift,
        batch_id,
    })
}

/// Ticket income plus recorded entries, narrowed by `filter`.
pub fn tax_report(terminal: &Terminal, filter: &TaxFilter) -> ApiResult<TaxReport> {
    filter.validate().map_err(CoreError::from)?;

    let all = ledger_entries(
        &terminal.sales,
        &terminal.tax_entries,
        terminal.tenant.default_vat_rate,
    );
    let entries: Vec<TaxEntry> = filter.apply(&all).into_iter().cloned().collect();
    let totals = TaxTotals::collect(&entries);

    Ok(TaxReport {
        net_result: totals.net_result(),
        vat_settlement: totals.vat_settlement(),
        income_tax_instalment: totals.income_tax_instalment(terminal.tenant.irpf_rate),
        entries,
        totals,
    })
}
