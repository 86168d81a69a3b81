//! # Commands Module
//!
//! Everything the till screens can ask for.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs        ◄─── You are here (exports)
//! ├── session.rs    ◄─── Who is at the till
//! ├── shift.rs      ◄─── Open/close the drawer, camera events
//! ├── sale.rs       ◄─── Checkout
//! ├── table.rs      ◄─── Floor plan
//! ├── inventory.rs  ◄─── Ingredients, products, recipes, goods receipt
//! ├── waste.rs      ◄─── Breakage, invitations, staff drinks
//! ├── tax.rs        ◄─── Expenses and the tax report
//! └── forecast.rs   ◄─── Predictions, alerts, auto order
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  fn complete_sale(                                                      │
//! │      terminal: &mut Terminal,     ◄── the single mutator               │
//! │      request: CompleteSaleRequest ◄── deserialized from the screen     │
//! │  ) -> ApiResult<CompleteSaleResponse>                                   │
//! │         │                                                               │
//! │         ├── rules ────────► gastro-core (pure)                          │
//! │         ├── state ────────► terminal collections                        │
//! │         └── persistence ──► WriteBatch on the outbox (never awaited)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Requests and responses are camelCase JSON. A command either fails before
//! touching state or succeeds completely in memory; what happens to its
//! writes afterwards is reported by the outbox.

pub mod forecast;
pub mod inventory;
pub mod sale;
pub mod session;
pub mod shift;
pub mod table;
pub mod tax;
pub mod waste;
