//! Error types for endlist.

use thiserror::Error;

/// Result type alias using endlist's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for endlist operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Event not found
    #[error("Event not found: {0}")]
    EventNotFound(i64),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Projection could not be computed (fatal for the request)
    #[error("Computation error: {0}")]
    Computation(String),

    /// Operation exceeded its time budget
    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
