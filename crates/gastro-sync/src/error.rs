//! # Sync Error Types
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Persistence   │  │       Outbox            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  NotConfigured  │  │  QueueFull              │ │
//! │  │  ConfigLoad     │  │  Persistence    │  │  ShuttingDown           │ │
//! │  │                 │  │  Serialization  │  │  ChannelError           │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐                                                    │
//! │  │    Forecast     │  Never surfaced to the till: the forecast service │
//! │  │                 │  folds these into ForecastOutcome::Unavailable.   │
//! │  │  OracleFailed   │                                                    │
//! │  │  OracleMissing  │                                                    │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid terminal configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    // =========================================================================
    // Persistence Errors
    // =========================================================================
    /// No persistence backend is configured; the terminal runs local-only.
    #[error("Persistence backend not configured")]
    NotConfigured,

    /// The backend rejected or failed a read or write.
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    // =========================================================================
    // Outbox Errors
    // =========================================================================
    /// The outbound queue is at capacity; the batch was dropped.
    #[error("Outbox full ({capacity} batches pending)")]
    QueueFull { capacity: usize },

    #[error("Outbox is shutting down")]
    ShuttingDown,

    #[error("Channel error: {0}")]
    ChannelError(String),

    // =========================================================================
    // Forecast Errors
    // =========================================================================
    #[error("Forecast oracle failed: {0}")]
    OracleFailed(String),

    #[error("No forecast oracle configured")]
    OracleNotConfigured,

    #[error("Internal error: {0}")]
    Internal(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<gastro_db::DbError> for SyncError {
    fn from(err: gastro_db::DbError) -> Self {
        SyncError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::SerializationFailed(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::NotConfigured
                | SyncError::OracleNotConfigured
        )
    }
}
