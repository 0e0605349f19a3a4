//! Error types for the core library

use thiserror::Error;

/// Handle and pool errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HandleError {
    /// Handle is the sentinel, out of range, or its generation is stale
    #[error("Handle {bits:#010x} is not valid in this pool")]
    Invalid { bits: u32 },

    /// Every index the handle layout can address is in use
    #[error("Handle pool exhausted: index space ends at {limit}")]
    Exhausted { limit: u32 },
}

/// Result type alias
pub type Result<T> = core::result::Result<T, HandleError>;
