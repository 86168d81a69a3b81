//! # Tax Bookkeeping
//!
//! Builds [`TaxEntry`] lines and the quarterly totals a gestoría asks for.
//!
//! ## Where Entries Come From
//! ```text
//! ┌──────────────────────┬───────────┬────────┬──────────┬──────────────┐
//! │ Source               │ Kind      │ Rate   │ Manual   │ Cash-out     │
//! ├──────────────────────┼───────────┼────────┼──────────┼──────────────┤
//! │ Sale (derived)       │ Income    │ 10%    │ no       │ no           │
//! │ Quick expense        │ Expense   │ 21%    │ yes      │ yes (drawer) │
//! │ Goods receipt        │ Expense   │ 10%    │ no       │ no (invoice) │
//! └──────────────────────┴───────────┴────────┴──────────┴──────────────┘
//! ```
//!
//! Totals are VAT-inclusive; the base is `total / (1 + rate)`.
//!
//! ## Quarterly Forms
//! - **Modelo 303** (VAT): output VAT on income − input VAT on expenses
//! - **Modelo 130** (IRPF): `max(0, (income − expenses) × 20%)`

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Sale, TaxEntry, TaxEntryKind, TaxRate};

// =============================================================================
// Entry Constructors
// =============================================================================

impl TaxEntry {
    /// A hand-typed expense. `is_cash_out` marks money taken from the drawer.
    pub fn expense(
        concept: impl Into<String>,
        total: Money,
        rate: TaxRate,
        date: NaiveDate,
        is_cash_out: bool,
    ) -> Self {
        TaxEntry {
            id: Uuid::new_v4().to_string(),
            date,
            kind: TaxEntryKind::Expense,
            concept: concept.into(),
            base: total.net_of_tax(rate),
            tax_rate: rate,
            total,
            manual: true,
            is_cash_out,
            attachment_url: None,
        }
    }

    /// Quick expense paid from the drawer (ice, a plumber, bread).
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use gastro_core::types::{TaxEntry, TaxRate};
    /// use gastro_core::Money;
    ///
    /// let date = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
    /// let ice = TaxEntry::cash_out("Hielo", Money::from_cents(1210), TaxRate::GENERAL, date);
    /// assert!(ice.is_cash_out);
    /// assert_eq!(ice.base.cents(), 1000);
    /// ```
    pub fn cash_out(concept: impl Into<String>, total: Money, rate: TaxRate, date: NaiveDate) -> Self {
        Self::expense(concept, total, rate, date, true)
    }

    /// Supplier invoice for received goods. Paid by transfer, not from the
    /// drawer.
    pub fn purchase(
        ingredient_name: &str,
        quantity: f64,
        unit: &str,
        cost: Money,
        date: NaiveDate,
    ) -> Self {
        let mut entry = Self::expense(
            format!("Compra: {ingredient_name} ({quantity} {unit})"),
            cost,
            TaxRate::REDUCED,
            date,
            false,
        );
        entry.manual = false;
        entry
    }

    /// Income line derived from a ticket.
    pub fn from_sale(sale: &Sale, rate: TaxRate) -> Self {
        TaxEntry {
            id: format!("inc-{}", sale.id),
            date: sale.timestamp.date_naive(),
            kind: TaxEntryKind::Income,
            concept: format!("Ticket {}", sale.id),
            base: sale.total.net_of_tax(rate),
            tax_rate: rate,
            total: sale.total,
            manual: false,
            is_cash_out: false,
            attachment_url: None,
        }
    }

    pub fn with_attachment(mut self, url: impl Into<String>) -> Self {
        self.attachment_url = Some(url.into());
        self
    }
}

/// All ledger lines: one derived income per sale plus the recorded entries.
pub fn ledger_entries(sales: &[Sale], recorded: &[TaxEntry], sales_rate: TaxRate) -> Vec<TaxEntry> {
    sales
        .iter()
        .map(|sale| TaxEntry::from_sale(sale, sales_rate))
        .chain(recorded.iter().cloned())
        .collect()
}

// =============================================================================
// Totals
// =============================================================================

/// VAT-inclusive totals over a set of entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TaxTotals {
    pub income: Money,
    pub expenses: Money,
    /// IVA repercutido.
    pub vat_output: Money,
    /// IVA soportado.
    pub vat_input: Money,
}

impl TaxTotals {
    pub fn collect<'a>(entries: impl IntoIterator<Item = &'a TaxEntry>) -> Self {
        entries
            .into_iter()
            .fold(TaxTotals::default(), |mut totals, entry| {
                match entry.kind {
                    TaxEntryKind::Income => {
                        totals.income += entry.total;
                        totals.vat_output += entry.tax_amount();
                    }
                    TaxEntryKind::Expense => {
                        totals.expenses += entry.total;
                        totals.vat_input += entry.tax_amount();
                    }
                }
                totals
            })
    }

    pub fn net_result(&self) -> Money {
        self.income - self.expenses
    }

    /// Modelo 303: VAT to pay (negative means to be refunded).
    pub fn vat_settlement(&self) -> Money {
        self.vat_output - self.vat_input
    }

    /// Modelo 130: fractional IRPF payment, never negative.
    pub fn income_tax_instalment(&self, rate: TaxRate) -> Money {
        self.net_result().clamp_non_negative().percent(rate)
    }
}

// =============================================================================
// Filter
// =============================================================================

/// Narrowing for the tax report screen. Date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxFilter {
    pub kind: Option<TaxEntryKind>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl TaxFilter {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(ValidationError::InvalidFormat {
                    field: "date range".to_string(),
                    reason: format!("{from} is after {to}"),
                });
            }
        }
        Ok(())
    }

    pub fn matches(&self, entry: &TaxEntry) -> bool {
        self.kind.map_or(true, |k| k == entry.kind)
            && self.from.map_or(true, |from| entry.date >= from)
            && self.to.map_or(true, |to| entry.date <= to)
    }

    pub fn apply<'a>(&self, entries: &'a [TaxEntry]) -> Vec<&'a TaxEntry> {
        entries.iter().filter(|e| self.matches(e)).collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
