//! # API Error Type
//!
//! Unified error type for terminal commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Terminal                           │
//! │                                                                         │
//! │  complete_sale(&mut terminal, request)                                  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Validation Error? ── ValidationError ─► CoreError ──┐                  │
//! │         │                                            │                  │
//! │         ▼                                            ▼                  │
//! │  Business rule?   ── CoreError::NoOpenShift ───────► ApiError ──► UI    │
//! │         │                                            ▲                  │
//! │         ▼                                            │                  │
//! │  Store at startup? ── DbError / SyncError ───────────┘                  │
//! │                                                                         │
//! │  Writes queued on the outbox never fail a command: their outcome        │
//! │  arrives later as a DeliveryReport.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The UI receives both a machine-readable `code` and a message it can show.

use serde::Serialize;

use gastro_core::CoreError;
use gastro_db::DbError;
use gastro_sync::SyncError;

/// Error returned from terminal commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "SHIFT_ERROR",
///   "message": "Shift s-1718000000000 is already open"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Nobody is signed in, or the user lacks the role
    Unauthorized,

    /// Shift open/close rule violated
    ShiftError,

    /// Table is not in the state the action needs
    TableError,

    /// A consumption referenced an unknown product or ingredient
    StockError,

    /// Payment processing error
    PaymentError,

    /// Database operation failed (500)
    DatabaseError,

    /// Config, outbox or oracle failure
    SyncError,

    /// Internal error (500)
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::ShiftAlreadyOpen { .. }
            | CoreError::NoOpenShift
            | CoreError::ShiftNotOpen { .. }
            | CoreError::InvalidShiftRecord { .. } => ApiError::new(ErrorCode::ShiftError, message),
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CoreError::IngredientNotFound(id) => ApiError::not_found("Ingredient", &id),
            CoreError::TableNotFound(id) => ApiError::not_found("Table", &id),
            CoreError::MissingReference { .. } => ApiError::new(ErrorCode::StockError, message),
            CoreError::TableNotFree { .. } | CoreError::TableNotOccupied { .. } => {
                ApiError::new(ErrorCode::TableError, message)
            }
            CoreError::InvalidPaymentAmount { .. } => ApiError::new(ErrorCode::PaymentError, message),
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ConnectionFailed(_) | DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database unavailable")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            other => {
                // Log the actual error but return a generic message
                tracing::error!(error = %other, "Database operation failed");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        if err.is_config_error() {
            return ApiError::new(ErrorCode::SyncError, err.to_string());
        }
        match err {
            SyncError::Persistence(e) => {
                tracing::error!(error = %e, "Persistence backend failed");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            SyncError::Internal(e) => ApiError::internal(e),
            other => ApiError::new(ErrorCode::SyncError, other.to_string()),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for terminal commands.
pub type ApiResult<T> = Result<T, ApiError>;
