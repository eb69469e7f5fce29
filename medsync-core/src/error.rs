//! Error types for medsync.

use thiserror::Error;

/// Errors that can occur inside medsync components.
///
/// These never reach the user-facing `SyncResult` as values: the engine
/// turns them into display strings at its boundary.
#[derive(Error, Debug)]
pub enum MedSyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Calendar not found: {0}")]
    CalendarNotFound(String),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Calendar access denied: {0}")]
    PermissionDenied(String),

    #[error("Calendar store error: {0}")]
    Store(String),

    #[error("Domain provider error: {0}")]
    Provider(String),

    #[error("Unknown timezone '{0}'")]
    UnknownTimezone(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for medsync operations.
pub type MedSyncResult<T> = Result<T, MedSyncError>;
