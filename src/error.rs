//! ember - Custom Error Types
//! Defines the error hierarchy for the store.

use thiserror::Error;

/// Custom Result type for the ember engine.
pub type Result<T> = std::result::Result<T, EmberError>;

/// Error types for the ember store.
#[derive(Error, Debug)]
pub enum EmberError {
    /// I/O errors from file operations on the command log.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Timestamp encoding errors while writing log records.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Command log replay failure at startup.
    #[error("Recovery failed: {0}")]
    RecoveryFailed(String),
}
