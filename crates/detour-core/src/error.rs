use thiserror::Error;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors surfaced by redirect, content and settings stores.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("record already exists: {0}")]
    Conflict(String),
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}

/// Errors raised while registering content types at start-up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("content type uid is empty")]
    EmptyUid,
    #[error("content type {uid} has an empty type name")]
    EmptyTypeName { uid: String },
    #[error("content type {uid} has an invalid plural name '{plural}'")]
    InvalidPluralName { uid: String, plural: String },
    #[error("content type {0} is registered twice")]
    Duplicate(String),
}
