//! # gastro-core: Pure Business Logic for GastroSmart POS
//!
//! Everything the till decides lives here as plain data and pure functions:
//! who owns the cash drawer, how much keg a pint costs, which table is free.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      GastroSmart Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/terminal (commands)                        │   │
//! │  │   complete_sale, close_shift, register_waste, move_order ...    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ gastro-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────┐ │   │
//! │  │   │  ledger  │ │  stock   │ │  tables  │ │   tax    │ │ fcst │ │   │
//! │  │   │  Shift   │ │  Recipe  │ │  Floor   │ │ Modelo   │ │Alerts│ │   │
//! │  │   │  Cash    │ │  Mixer   │ │  Moves   │ │ 303/130  │ │Orders│ │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘ └──────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • NO CLOCK                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          gastro-db / gastro-sync (persistence, outbox)          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Ingredient, Product, Sale, Shift, Table, ...)
//! - [`money`] - Euro amounts as integer cents
//! - [`ledger`] - The shift repository and cash reconciliation
//! - [`stock`] - Recipe-based stock propagation
//! - [`tables`] - The table floor and its action log
//! - [`tax`] - Tax entries and quarterly totals
//! - [`forecast`] - Prediction filtering and auto-order planning
//! - [`validation`] - Input validation for catalogue edits and checkout
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use gastro_core::money::Money;
//! use gastro_core::types::TaxRate;
//!
//! // A 2.20 € coffee carries 10% VAT inside the price
//! let total = Money::from_cents(220);
//! let base = total.net_of_tax(TaxRate::REDUCED);
//! assert_eq!(base.cents(), 200);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod forecast;
pub mod ledger;
pub mod money;
pub mod stock;
pub mod tables;
pub mod tax;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::{ShiftClosure, ShiftRepository};
pub use money::Money;
pub use stock::{Consumption, ConsumptionEvent, MissingReferencePolicy, StockPropagator};
pub use tables::TableFloor;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Tenant id used when no tenant is configured.
pub const DEFAULT_TENANT_ID: &str = "t_gastrosmart";

/// Mixer reference meaning "served neat". Never decremented.
pub const NO_MIXER: &str = "none";

/// Maximum quantity of a single line on a ticket.
///
/// ## Business Reason
/// Catches a slipped finger (100 cañas instead of 10) before it hits the keg.
pub const MAX_LINE_QUANTITY: i64 = 99;

/// Cash discrepancies smaller than this are treated as a balanced drawer.
pub const DISCREPANCY_TOLERANCE: Money = Money::from_cents(1);
