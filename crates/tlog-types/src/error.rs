//! Error types for tlog-types

use thiserror::Error;

/// Errors that can occur in tlog-types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid encoding (hex)
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Digest has the wrong number of bytes
    #[error("Invalid digest length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Result type for tlog-types operations
pub type Result<T> = std::result::Result<T, Error>;
