//! Core types for the tlog Merkle log
//!
//! This crate provides the digest type shared by the tree builder, the proof
//! generators and verifiers, and the persisted tree format.

pub mod encoding;
pub mod error;

pub use encoding::{Sha256Hash, SHA256_SIZE};
pub use error::{Error, Result};
