//! Error types for substrate operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while talking to a substrate.
#[derive(Debug, Error)]
pub enum KvError {
    /// The backend cannot serve requests (connection lost, timeout, closed).
    #[error("substrate unavailable: {0}")]
    Unavailable(String),

    /// A lock guarding in-process state was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    /// A value could not be represented by the backend.
    #[error("unsupported value for key {key}: {reason}")]
    UnsupportedValue { key: String, reason: String },

    /// The backing file exists but does not hold a valid key space.
    #[error("corrupt data file {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// I/O error from a file-based backend.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for substrate operations.
pub type KvResult<T> = std::result::Result<T, KvError>;
