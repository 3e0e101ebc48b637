//! Error types for netkv
//!
//! Provides a unified error type for all operations.

use std::time::Duration;

use thiserror::Error;

/// Result type alias using NetKvError
pub type Result<T> = std::result::Result<T, NetKvError>;

/// Unified error type for netkv operations
#[derive(Debug, Error)]
pub enum NetKvError {
    // -------------------------------------------------------------------------
    // Key / TTL Validation Errors
    // -------------------------------------------------------------------------
    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("ttl '{0:?}' is too short")]
    TtlTooShort(Duration),

    // -------------------------------------------------------------------------
    // Engine Errors
    // -------------------------------------------------------------------------
    #[error("item not found")]
    NotFound,

    #[error("cache is not running")]
    NotRunning,

    /// Keys pruned at load time because their value files were missing.
    /// Non-fatal: surviving entries remain loaded.
    #[error("{} entries failed integrity verification: {}", .0.len(), .0.join(", "))]
    Integrity(Vec<String>),

    #[error("{0} errors occurred while clearing the cache")]
    Clear(usize),

    // -------------------------------------------------------------------------
    // Wire Errors
    // -------------------------------------------------------------------------
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    #[error("unexpected end of stream")]
    Eof,

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Request Errors
    // -------------------------------------------------------------------------
    #[error("request timed out")]
    Timeout,

    #[error("error from server: {0}")]
    Server(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for NetKvError {
    fn from(err: serde_json::Error) -> Self {
        NetKvError::Serialization(err.to_string())
    }
}

impl From<Box<bincode::ErrorKind>> for NetKvError {
    fn from(err: Box<bincode::ErrorKind>) -> Self {
        NetKvError::Serialization(err.to_string())
    }
}
