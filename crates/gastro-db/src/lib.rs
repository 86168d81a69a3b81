//! # gastro-db: Record Store for GastroSmart POS
//!
//! Local SQLite storage for the terminal, built on sqlx. Every collection
//! is a table of JSON documents.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        GastroSmart Data Flow                            │
//! │                                                                         │
//! │  Outbox batch [UpsertShift, InsertSale]                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     gastro-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐    │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │    │   │
//! │  │   │   (pool.rs)   │◄───│  RecordStore  │    │  (embedded)  │    │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘    │   │
//! │  │                                │ naming (camelCase ⇄ snake_case)│   │
//! │  └────────────────────────────────┼────────────────────────────────┘   │
//! │                                   ▼                                     │
//! │                      SQLite: id | payload (JSON) | sort_key | status    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`naming`] - Key-case conversion at the storage boundary
//! - [`repository`] - Typed repositories over [`repository::RecordStore`]
//! - [`seed`] - The initial café dataset
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gastro_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("bar.db")).await?;
//! let open = db.shifts().active().await?;
//! let menu = db.products().list().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod naming;
pub mod pool;
pub mod repository;
pub mod seed;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use seed::{seed_database, SeedSummary};

// Repository re-exports for convenience
pub use repository::catalogue::{IngredientRepository, ProductRepository, SupplierRepository};
pub use repository::ledger::{SaleRepository, TaxEntryRepository, WasteRepository};
pub use repository::shift::ShiftRecordRepository;
pub use repository::staff::UserRepository;
pub use repository::{Record, RecordStore};
