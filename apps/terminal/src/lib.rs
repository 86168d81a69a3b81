//! # GastroSmart Terminal Library
//!
//! The till itself: in-memory state, the commands the screens call, and the
//! error type they return.
//!
//! ## Module Organization
//! ```text
//! gastro_terminal/
//! ├── lib.rs          ◄─── You are here (exports, logging)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── terminal.rs ◄─── Collections, shift ledger, floor plan
//! │   └── boot.rs     ◄─── Startup hydration from the record store
//! ├── commands/       ◄─── session, shift, sale, table, inventory,
//! │                        waste, tax, forecast
//! └── error.rs        ◄─── API error type for commands
//! ```
//!
//! ## Storage Modes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  LocalOnly ── no store configured or unreachable at startup            │
//! │               seed data, every write stays in memory                    │
//! │                                                                         │
//! │  Mirrored ─── store reachable at startup                                │
//! │               collections hydrated from it, every command enqueues a    │
//! │               WriteBatch on the outbox and returns immediately          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod error;
pub mod state;

#[cfg(test)]
mod testing;

use tracing_subscriber::EnvFilter;

pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::{Diagnostics, Mirror, StorageMode, Terminal};

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=gastro=trace` - Show trace for gastro crates only
/// - Default: INFO, DEBUG for gastro crates
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,gastro=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
