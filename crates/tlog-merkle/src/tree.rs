//! Merkle tree hashing and construction
//!
//! Trees are built level by level from an ordered list of leaf hashes. Adjacent
//! nodes are paired left to right; when a level has an odd number of nodes the
//! trailing node is paired with itself. Building stops at a single node, the
//! root.
//!
//! Two hashing schemes are supported:
//! - [`HashScheme::Legacy`]: SHA256(data) for leaves and SHA256(hex(left) || hex(right))
//!   for nodes, compatible with existing `merkle.tree` files
//! - [`HashScheme::DomainSeparated`]: RFC 6962 prefixes (0x00 for leaf, 0x01 for node)

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tlog_types::Sha256Hash;

use crate::error::{Error, Result};

/// Prefix for leaf nodes in the domain separated scheme
pub const LEAF_HASH_PREFIX: u8 = 0x00;

/// Prefix for internal nodes in the domain separated scheme
pub const NODE_HASH_PREFIX: u8 = 0x01;

/// Rule used to hash leaves and combine child nodes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashScheme {
    /// No domain separation; nodes hash the hex text of their children
    #[default]
    Legacy,
    /// Leaves and nodes are tagged with distinct one-byte prefixes
    DomainSeparated,
}

impl HashScheme {
    /// Hash a leaf item
    ///
    /// Returns: SHA256(data) or SHA256(0x00 || data)
    pub fn hash_leaf(&self, data: &[u8]) -> Sha256Hash {
        let mut hasher = Sha256::new();
        if let HashScheme::DomainSeparated = self {
            hasher.update([LEAF_HASH_PREFIX]);
        }
        hasher.update(data);
        Sha256Hash::from_bytes(hasher.finalize().into())
    }

    /// Hash two child nodes to create a parent node
    ///
    /// Returns: SHA256(hex(left) || hex(right)) or SHA256(0x01 || left || right)
    pub fn hash_children(&self, left: &Sha256Hash, right: &Sha256Hash) -> Sha256Hash {
        let mut hasher = Sha256::new();
        match self {
            HashScheme::Legacy => {
                hasher.update(left.to_hex().as_bytes());
                hasher.update(right.to_hex().as_bytes());
            }
            HashScheme::DomainSeparated => {
                hasher.update([NODE_HASH_PREFIX]);
                hasher.update(left.as_bytes());
                hasher.update(right.as_bytes());
            }
        }
        Sha256Hash::from_bytes(hasher.finalize().into())
    }

    /// Name used in persisted files and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            HashScheme::Legacy => "legacy",
            HashScheme::DomainSeparated => "domain_separated",
        }
    }
}

impl std::fmt::Display for HashScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A leaf of the tree together with the item it was computed from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    /// Hash of the item
    pub hash: Sha256Hash,
    /// Original item text, when the tree was built from raw items
    pub data: Option<String>,
}

/// Immutable Merkle tree with every level retained
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    scheme: HashScheme,
    leaves: Vec<Leaf>,
    levels: Vec<Vec<Sha256Hash>>,
    root: Sha256Hash,
}

impl MerkleTree {
    /// Build a tree from raw items, hashing each one as a leaf
    pub fn from_items<I, S>(scheme: HashScheme, items: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let leaves = items
            .into_iter()
            .map(|item| {
                let data = item.into();
                Leaf {
                    hash: scheme.hash_leaf(data.as_bytes()),
                    data: Some(data),
                }
            })
            .collect();
        Self::from_leaves(scheme, leaves)
    }

    /// Build a tree from precomputed leaf hashes
    pub fn from_leaf_hashes(scheme: HashScheme, hashes: Vec<Sha256Hash>) -> Result<Self> {
        let leaves = hashes
            .into_iter()
            .map(|hash| Leaf { hash, data: None })
            .collect();
        Self::from_leaves(scheme, leaves)
    }

    /// Build a tree from leaves
    pub fn from_leaves(scheme: HashScheme, leaves: Vec<Leaf>) -> Result<Self> {
        if leaves.is_empty() {
            return Err(Error::EmptyInput);
        }

        let mut levels = vec![leaves.iter().map(|leaf| leaf.hash).collect::<Vec<_>>()];
        while let Some(level) = levels.last().filter(|level| level.len() > 1) {
            let next = next_level(scheme, level);
            levels.push(next);
        }
        let root = levels[levels.len() - 1][0];

        tracing::debug!(
            leaves = leaves.len(),
            levels = levels.len(),
            %root,
            %scheme,
            "built Merkle tree"
        );

        Ok(Self {
            scheme,
            leaves,
            levels,
            root,
        })
    }

    /// Root hash
    pub fn root(&self) -> Sha256Hash {
        self.root
    }

    /// Number of leaves
    pub fn size(&self) -> u64 {
        self.leaves.len() as u64
    }

    /// Hashing scheme the tree was built with
    pub fn scheme(&self) -> HashScheme {
        self.scheme
    }

    /// Leaves in insertion order
    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    /// Level 0 hashes
    pub fn leaf_hashes(&self) -> &[Sha256Hash] {
        &self.levels[0]
    }

    /// All levels, from the leaves (index 0) up to the root
    pub fn levels(&self) -> &[Vec<Sha256Hash>] {
        &self.levels
    }

    /// Index of the first leaf with the given hash
    pub fn position_of(&self, leaf_hash: &Sha256Hash) -> Option<u64> {
        self.leaf_hashes()
            .iter()
            .position(|hash| hash == leaf_hash)
            .map(|index| index as u64)
    }
}

/// Compute the root over a list of leaf hashes without keeping the levels
pub fn compute_root(scheme: HashScheme, leaves: &[Sha256Hash]) -> Result<Sha256Hash> {
    if leaves.is_empty() {
        return Err(Error::EmptyInput);
    }
    let mut current = leaves.to_vec();
    while current.len() > 1 {
        current = next_level(scheme, &current);
    }
    Ok(current[0])
}

/// Pair adjacent nodes, duplicating the trailing node of an odd level
fn next_level(scheme: HashScheme, level: &[Sha256Hash]) -> Vec<Sha256Hash> {
    level
        .chunks(2)
        .map(|pair| {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);
            scheme.hash_children(left, right)
        })
        .collect()
}
