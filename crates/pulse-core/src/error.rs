//! Error types for pulse-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid zone table: {0}")]
    InvalidZoneTable(String),

    #[error("Invalid remap policy: {0}")]
    InvalidRemap(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
