//! Spatial index errors

use thiserror::Error;

/// Errors raised when restoring a BVH snapshot
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpatialError {
    /// Snapshot does not describe a well-formed tree
    #[error("Malformed BVH state: {0}")]
    MalformedState(String),
}

/// Result type for spatial operations
pub type Result<T> = std::result::Result<T, SpatialError>;
