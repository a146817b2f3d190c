//! Error types for tlog-merkle

use thiserror::Error;

/// Errors that can occur in Merkle tree operations
#[derive(Error, Debug)]
pub enum Error {
    /// Tree build attempted over zero leaves
    #[error("Cannot build a Merkle tree from zero leaves")]
    EmptyInput,

    /// Inclusion proof requested for a digest absent from the leaf level
    #[error("Leaf {0} not found in tree")]
    TargetNotFound(String),

    /// Old leaf sequence is not a literal prefix of the new one
    #[error("Trees are not consistent: {0}")]
    NotConsistentPrefix(String),

    /// Persisted tree data is missing levels or fields, or does not match its recomputation
    #[error("Malformed persisted tree: {0}")]
    MalformedPersistedTree(String),

    /// Recomputed root differs from the expected root
    #[error("Proof mismatch: expected {expected}, got {actual}")]
    ProofMismatch { expected: String, actual: String },

    /// Invalid proof format
    #[error("Invalid proof: {0}")]
    InvalidProof(String),

    /// Invalid tree size
    #[error("Invalid tree size: {0}")]
    InvalidTreeSize(String),

    /// Invalid leaf index
    #[error("Invalid leaf index: {0}")]
    InvalidLeafIndex(String),

    /// Digest decoding error
    #[error(transparent)]
    Types(#[from] tlog_types::Error),

    /// I/O error while reading or writing a persisted tree
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for Merkle tree operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_capitalized() {
        let errors = [
            Error::EmptyInput,
            Error::TargetNotFound("ab".repeat(32)),
            Error::NotConsistentPrefix("leaf 0 differs".to_string()),
            Error::MalformedPersistedTree("tree has no levels".to_string()),
            Error::InvalidProof("insufficient proof hashes".to_string()),
        ];
        for error in errors {
            let message = error.to_string();
            assert!(
                message.starts_with(|c: char| c.is_ascii_uppercase()),
                "{}",
                message
            );
        }
        assert_eq!(
            Error::EmptyInput.to_string(),
            "Cannot build a Merkle tree from zero leaves"
        );
    }
}
