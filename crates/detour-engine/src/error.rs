use detour_core::{ContentTypeUid, StorageError};
use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Reasons a content type and slug cannot be turned into a path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("empty slug for content type {0}")]
    EmptySlug(ContentTypeUid),
    #[error("content type {0} has no usable path segment")]
    NoSegment(ContentTypeUid),
}

#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("path mapping failed: {0}")]
    Path(#[from] PathError),
    #[error("storage operation failed: {0}")]
    Storage(#[from] StorageError),
}
