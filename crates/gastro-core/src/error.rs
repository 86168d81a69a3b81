//! # Error Types
//!
//! Domain-specific error types for gastro-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  gastro-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  gastro-db errors                                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  gastro-sync errors                                                    │
//! │  └── SyncError        - Config, outbox and oracle failures             │
//! │                                                                         │
//! │  Terminal errors (in app)                                              │
//! │  └── ApiError         - What the frontend sees (serialized)            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → Frontend               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A shift is already open; only one cash drawer owner at a time.
    ///
    /// ## User Workflow
    /// ```text
    /// Laura opens shift (base 150 €)
    ///      │
    ///      ▼
    /// Marcos taps "Abrir caja"
    ///      │
    ///      ▼
    /// ShiftAlreadyOpen { shift_id: "s-1718000000000-3fa9c1" }
    ///      │
    ///      ▼
    /// UI shows: "There is already an open shift"
    /// ```
    #[error("Shift {shift_id} is already open")]
    ShiftAlreadyOpen { shift_id: String },

    /// An operation needed an open shift and there is none.
    #[error("No shift is open")]
    NoOpenShift,

    /// The caller referenced a shift that is not the open one.
    #[error("Shift {requested} is not open (open shift: {open})")]
    ShiftNotOpen { requested: String, open: String },

    /// A shift record handed to the repository is not usable as the open slot.
    #[error("Shift {shift_id} cannot be restored: {reason}")]
    InvalidShiftRecord { shift_id: String, reason: String },

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Ingredient not found: {0}")]
    IngredientNotFound(String),

    /// A consumption event referenced something that is not in the catalogue.
    ///
    /// Only raised under [`MissingReferencePolicy::Reject`](crate::stock::MissingReferencePolicy).
    #[error("Unknown {kind} referenced by consumption: {id}")]
    MissingReference { kind: String, id: String },

    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Destination of an open/move must be free.
    #[error("Table {table_id} is not free")]
    TableNotFree { table_id: String },

    /// The table has no running order.
    #[error("Table {table_id} has no open order")]
    TableNotOccupied { table_id: String },

    /// Payment amount is invalid.
    #[error("Invalid payment amount: {reason}")]
    InvalidPaymentAmount { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g. a date range that ends before it starts).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
