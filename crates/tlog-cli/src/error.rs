//! Error types for tlog-cli

use thiserror::Error;

/// Errors that end a command with a non-zero exit status
#[derive(Error, Debug)]
pub enum CliError {
    /// Tree, proof or persistence error
    #[error(transparent)]
    Merkle(#[from] tlog_merkle::Error),

    /// Failed to write command output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to encode JSON output
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
