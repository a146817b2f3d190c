//! Merkle tree construction and proofs for append-only logs
//!
//! This crate builds duplication-padded Merkle trees over ordered item lists
//! and implements inclusion and consistency proof generation and verification
//! on top of them, plus the JSON format used to persist a tree.

pub mod error;
pub mod persist;
pub mod proof;
pub mod tree;

pub use error::{Error, Result};
pub use persist::{PersistedNode, PersistedTree, DEFAULT_TREE_FILE};
pub use proof::{
    check_consistency, check_inclusion, prove_consistency, verify_consistency_proof,
    verify_inclusion_proof, ConsistencyProof, InclusionProof,
};
pub use tlog_types::Sha256Hash;
pub use tree::{compute_root, HashScheme, Leaf, MerkleTree, LEAF_HASH_PREFIX, NODE_HASH_PREFIX};
