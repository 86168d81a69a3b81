//! # State Module
//!
//! Everything the till holds in memory between commands.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                         Terminal                                │   │
//! │  │                                                                 │   │
//! │  │  catalogue      ingredients · products · suppliers · users      │   │
//! │  │  ledgers        sales · tax entries · waste                     │   │
//! │  │  drawer         ShiftRepository (one open shift at most)        │   │
//! │  │  floor          TableFloor                                      │   │
//! │  │  policies       StockPropagator · alert days · sales window     │   │
//! │  │  collaborators  Option<OutboxHandle> · ForecastService          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                              │                                          │
//! │               commands take &mut Terminal                               │
//! │                                                                         │
//! │  THREAD SAFETY:                                                         │
//! │  • One mutator: commands run one at a time                             │
//! │  • The outbox task only sees cloned records, never the state           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod boot;
mod terminal;

pub use boot::Mirror;
pub use terminal::{Diagnostics, StorageMode, Terminal};
