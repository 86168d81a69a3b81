//! # gastro-sync: Persistence & Outbound Writes for GastroSmart POS
//!
//! Everything the terminal does that leaves the process: mirroring state
//! to a [`PersistenceBackend`], queueing writes on the [`Outbox`], asking a
//! [`ForecastOracle`] for purchase predictions, and reading
//! [`TerminalConfig`].
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Terminal (single mutator)                                             │
//! │        │ enqueue(WriteBatch)                 │ forecast(request)        │
//! │        ▼                                     ▼                          │
//! │   ┌──────────────┐                   ┌──────────────────┐               │
//! │   │ OutboxHandle │                   │ ForecastService  │               │
//! │   └──────┬───────┘                   └────────┬─────────┘               │
//! │          │ mpsc                               │ await                   │
//! │          ▼                                    ▼                         │
//! │   ┌──────────────┐   DeliveryReport   ┌──────────────────┐              │
//! │   │ Outbox task  │──── broadcast ───► │ dyn ForecastOracle│             │
//! │   └──────┬───────┘                    └──────────────────┘              │
//! │          ▼                                                              │
//! │   dyn PersistenceBackend  (gastro_db::Database)                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`backend`] - `PersistenceBackend` trait and its SQLite implementation
//! - [`config`] - Terminal configuration (TOML + environment)
//! - [`error`] - Sync error types
//! - [`forecast`] - `ForecastOracle` trait and `ForecastService`
//! - [`outbox`] - Best-effort ordered write queue
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gastro_sync::{Outbox, OutboundWrite, TerminalConfig, WriteBatch};
//!
//! let config = TerminalConfig::load_or_default(None);
//! let (outbox, task) = Outbox::start(Arc::new(database), config.outbox.capacity);
//!
//! outbox.enqueue(
//!     WriteBatch::new("complete_sale")
//!         .then(OutboundWrite::UpsertShift(shift))
//!         .then(OutboundWrite::InsertSale(sale)),
//! )?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backend;
pub mod config;
pub mod error;
pub mod forecast;
pub mod outbox;

// =============================================================================
// Re-exports
// =============================================================================

pub use backend::PersistenceBackend;
pub use config::TerminalConfig;
pub use error::{SyncError, SyncResult};
pub use forecast::{ForecastOracle, ForecastService};
pub use outbox::{
    DeliveryReport, OutboundWrite, Outbox, OutboxHandle, StepOutcome, StepReport, WriteBatch,
};
