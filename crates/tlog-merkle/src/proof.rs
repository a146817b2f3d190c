//! Merkle proof generation and verification
//!
//! Inclusion proofs are the sibling path from a leaf to the root. No left/right
//! flags are carried: the combination order at each level follows from the
//! parity of the node index, and levels where the node was the trailing node of
//! an odd level contribute no hash at all (the node was paired with itself).
//!
//! Consistency proofs show that an older leaf sequence is a prefix of a newer
//! one. The proof is `[old_root, suffix_root, new_root]`, where `suffix_root`
//! is the root of the appended leaves built as a tree of their own. Verifying it
//! requires both leaf sets; the roots are rebuilt and compared against the
//! claims rather than chained from the proof hashes alone.

use serde::{Deserialize, Serialize};
use tlog_types::Sha256Hash;

use crate::error::{Error, Result};
use crate::tree::{compute_root, HashScheme, MerkleTree};

/// Sibling path from one leaf to the root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    /// Index of the leaf in the tree (0-based)
    pub leaf_index: u64,
    /// Total number of leaves in the tree
    pub tree_size: u64,
    /// Sibling hashes, ordered from the leaf level upward
    pub hashes: Vec<Sha256Hash>,
}

impl InclusionProof {
    /// Verify this proof for `leaf_hash` against `expected_root`
    pub fn verify(
        &self,
        scheme: HashScheme,
        leaf_hash: &Sha256Hash,
        expected_root: &Sha256Hash,
    ) -> Result<()> {
        verify_inclusion_proof(
            scheme,
            leaf_hash,
            self.leaf_index,
            self.tree_size,
            &self.hashes,
            expected_root,
        )
    }
}

/// Evidence that an older tree's leaves are a prefix of a newer tree's leaves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyProof {
    /// Number of leaves in the older tree
    pub old_size: u64,
    /// Number of leaves in the newer tree
    pub new_size: u64,
    /// `[old_root, suffix_root, new_root]`; a single root when the sizes are equal
    pub hashes: Vec<Sha256Hash>,
}

impl ConsistencyProof {
    /// First proof entry, the old root
    pub fn old_root(&self) -> Option<&Sha256Hash> {
        self.hashes.first()
    }

    /// Last proof entry, the new root
    pub fn new_root(&self) -> Option<&Sha256Hash> {
        self.hashes.last()
    }

    /// Verify this proof against the claimed roots and both leaf sets
    pub fn verify(
        &self,
        scheme: HashScheme,
        old_root: &Sha256Hash,
        new_root: &Sha256Hash,
        old_leaves: &[Sha256Hash],
        new_leaves: &[Sha256Hash],
    ) -> Result<()> {
        if self.old_size != old_leaves.len() as u64 || self.new_size != new_leaves.len() as u64 {
            return Err(Error::InvalidTreeSize(format!(
                "proof covers sizes {} -> {}, leaf sets have {} -> {}",
                self.old_size,
                self.new_size,
                old_leaves.len(),
                new_leaves.len()
            )));
        }
        verify_consistency_proof(
            scheme,
            &self.hashes,
            old_root,
            new_root,
            old_leaves,
            new_leaves,
        )
    }
}

impl MerkleTree {
    /// Generate an inclusion proof for the first leaf equal to `leaf_hash`
    pub fn prove_inclusion(&self, leaf_hash: &Sha256Hash) -> Result<InclusionProof> {
        let index = self
            .position_of(leaf_hash)
            .ok_or_else(|| Error::TargetNotFound(leaf_hash.to_hex()))?;
        self.prove_inclusion_at(index)
    }

    /// Generate an inclusion proof for the leaf at `leaf_index`
    pub fn prove_inclusion_at(&self, leaf_index: u64) -> Result<InclusionProof> {
        if leaf_index >= self.size() {
            return Err(Error::InvalidLeafIndex(format!(
                "leaf index {} >= tree size {}",
                leaf_index,
                self.size()
            )));
        }

        let levels = self.levels();
        let mut hashes = Vec::with_capacity(levels.len() - 1);
        let mut index = leaf_index as usize;
        for level in &levels[..levels.len() - 1] {
            // An even trailing node has no sibling: it was paired with itself
            let sibling = if index % 2 == 0 { index + 1 } else { index - 1 };
            if let Some(hash) = level.get(sibling) {
                hashes.push(*hash);
            }
            index /= 2;
        }

        tracing::debug!(
            leaf_index,
            tree_size = self.size(),
            proof_len = hashes.len(),
            "generated inclusion proof"
        );

        Ok(InclusionProof {
            leaf_index,
            tree_size: self.size(),
            hashes,
        })
    }

    /// Generate a consistency proof from this tree to a newer one
    pub fn prove_consistency_to(&self, newer: &MerkleTree) -> Result<ConsistencyProof> {
        if self.scheme() != newer.scheme() {
            return Err(Error::NotConsistentPrefix(format!(
                "hash schemes differ: {} vs {}",
                self.scheme(),
                newer.scheme()
            )));
        }
        prove_consistency(self.scheme(), self.leaf_hashes(), newer.leaf_hashes())
    }
}

/// Generate an inclusion proof for a raw item
pub fn check_inclusion(tree: &MerkleTree, item: &str) -> Result<InclusionProof> {
    let leaf_hash = tree.scheme().hash_leaf(item.as_bytes());
    tree.prove_inclusion(&leaf_hash)
}

/// Verify an inclusion proof for a leaf in a Merkle tree
///
/// # Arguments
/// * `scheme` - Hashing scheme of the tree
/// * `leaf_hash` - The hash of the leaf entry
/// * `leaf_index` - Index of the leaf in the tree (0-based)
/// * `tree_size` - Total number of leaves in the tree
/// * `proof_hashes` - The hashes in the inclusion proof path
/// * `expected_root` - The expected root hash to verify against
///
/// # Returns
/// * `Ok(())` if the proof is valid
/// * `Err(...)` if the proof is invalid
pub fn verify_inclusion_proof(
    scheme: HashScheme,
    leaf_hash: &Sha256Hash,
    leaf_index: u64,
    tree_size: u64,
    proof_hashes: &[Sha256Hash],
    expected_root: &Sha256Hash,
) -> Result<()> {
    if tree_size == 0 {
        return Err(Error::InvalidTreeSize(
            "tree size cannot be zero".to_string(),
        ));
    }

    if leaf_index >= tree_size {
        return Err(Error::InvalidLeafIndex(format!(
            "leaf index {} >= tree size {}",
            leaf_index, tree_size
        )));
    }

    let expected_proof_len = expected_inclusion_proof_length(leaf_index, tree_size);
    if proof_hashes.len() != expected_proof_len {
        return Err(Error::InvalidProof(format!(
            "expected {} proof hashes for leaf {} in tree of size {}, got {}",
            expected_proof_len,
            leaf_index,
            tree_size,
            proof_hashes.len()
        )));
    }

    let mut hash = *leaf_hash;
    let mut index = leaf_index;
    let mut size = tree_size;
    let mut proof = proof_hashes.iter();

    while size > 1 {
        if size % 2 == 1 && index == size - 1 {
            hash = scheme.hash_children(&hash, &hash);
        } else {
            let sibling = proof
                .next()
                .ok_or_else(|| Error::InvalidProof("insufficient proof hashes".to_string()))?;
            hash = if index % 2 == 1 {
                scheme.hash_children(sibling, &hash)
            } else {
                scheme.hash_children(&hash, sibling)
            };
        }
        index /= 2;
        size = size.div_ceil(2);
    }

    if &hash != expected_root {
        tracing::debug!(
            leaf_index,
            tree_size,
            expected = %expected_root,
            actual = %hash,
            "inclusion proof does not reproduce the root"
        );
        return Err(Error::ProofMismatch {
            expected: expected_root.to_hex(),
            actual: hash.to_hex(),
        });
    }

    Ok(())
}

/// Calculate the expected inclusion proof length for a given leaf index and tree size
///
/// A node that is the last of an odd level is paired with itself, so that
/// level contributes nothing to the proof.
fn expected_inclusion_proof_length(leaf_index: u64, tree_size: u64) -> usize {
    let mut count = 0;
    let mut index = leaf_index;
    let mut size = tree_size;

    while size > 1 {
        if !(size % 2 == 1 && index == size - 1) {
            count += 1;
        }
        index /= 2;
        size = size.div_ceil(2);
    }

    count
}

/// Check that `old_leaves` is a literal, in-order prefix of `new_leaves`
fn check_prefix(old_leaves: &[Sha256Hash], new_leaves: &[Sha256Hash]) -> Result<()> {
    if old_leaves.is_empty() || new_leaves.is_empty() {
        return Err(Error::EmptyInput);
    }

    if old_leaves.len() > new_leaves.len() {
        return Err(Error::NotConsistentPrefix(format!(
            "old tree has {} leaves, new tree only {}",
            old_leaves.len(),
            new_leaves.len()
        )));
    }

    if let Some(index) = old_leaves
        .iter()
        .zip(new_leaves)
        .position(|(old, new)| old != new)
    {
        return Err(Error::NotConsistentPrefix(format!(
            "leaf {} differs between old and new tree",
            index
        )));
    }

    Ok(())
}

/// Generate a consistency proof between two leaf sequences
///
/// Fails with [`Error::NotConsistentPrefix`] unless `old_leaves` is a prefix of
/// `new_leaves`; no partial proof is ever returned.
pub fn prove_consistency(
    scheme: HashScheme,
    old_leaves: &[Sha256Hash],
    new_leaves: &[Sha256Hash],
) -> Result<ConsistencyProof> {
    check_prefix(old_leaves, new_leaves)?;

    let old_root = compute_root(scheme, old_leaves)?;
    let new_root = compute_root(scheme, new_leaves)?;

    let mut hashes = Vec::with_capacity(3);
    if old_leaves.len() != new_leaves.len() {
        hashes.push(old_root);
        let suffix = &new_leaves[old_leaves.len()..];
        hashes.push(compute_root(scheme, suffix)?);
    }

    if hashes.first() != Some(&old_root) {
        hashes.insert(0, old_root);
    }
    if hashes.last() != Some(&new_root) {
        hashes.push(new_root);
    }

    tracing::debug!(
        old_size = old_leaves.len(),
        new_size = new_leaves.len(),
        proof_len = hashes.len(),
        "generated consistency proof"
    );

    Ok(ConsistencyProof {
        old_size: old_leaves.len() as u64,
        new_size: new_leaves.len() as u64,
        hashes,
    })
}

/// Build trees over two item lists and prove the older is a prefix of the newer
pub fn check_consistency<S: AsRef<str>>(
    scheme: HashScheme,
    old_items: &[S],
    new_items: &[S],
) -> Result<ConsistencyProof> {
    let old = MerkleTree::from_items(scheme, old_items.iter().map(|s| s.as_ref()))?;
    let new = MerkleTree::from_items(scheme, new_items.iter().map(|s| s.as_ref()))?;
    old.prove_consistency_to(&new)
}

/// Verify a consistency proof between two tree states
///
/// # Arguments
/// * `scheme` - Hashing scheme of both trees
/// * `proof_hashes` - The hashes in the consistency proof
/// * `old_root` - Claimed root hash of the older tree
/// * `new_root` - Claimed root hash of the newer tree
/// * `old_leaves` - Leaf hashes of the older tree
/// * `new_leaves` - Leaf hashes of the newer tree
///
/// # Returns
/// * `Ok(())` if the proof is valid
/// * `Err(...)` if the proof is invalid
pub fn verify_consistency_proof(
    scheme: HashScheme,
    proof_hashes: &[Sha256Hash],
    old_root: &Sha256Hash,
    new_root: &Sha256Hash,
    old_leaves: &[Sha256Hash],
    new_leaves: &[Sha256Hash],
) -> Result<()> {
    let (first, last) = match (proof_hashes.first(), proof_hashes.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Err(Error::InvalidProof(
                "consistency proof cannot be empty".to_string(),
            ))
        }
    };

    if first != old_root {
        return Err(Error::ProofMismatch {
            expected: old_root.to_hex(),
            actual: first.to_hex(),
        });
    }
    if last != new_root {
        return Err(Error::ProofMismatch {
            expected: new_root.to_hex(),
            actual: last.to_hex(),
        });
    }

    check_prefix(old_leaves, new_leaves)?;

    let calc_old_root = compute_root(scheme, old_leaves)?;
    if &calc_old_root != old_root {
        return Err(Error::ProofMismatch {
            expected: old_root.to_hex(),
            actual: calc_old_root.to_hex(),
        });
    }

    let calc_new_root = compute_root(scheme, new_leaves)?;
    if &calc_new_root != new_root {
        return Err(Error::ProofMismatch {
            expected: new_root.to_hex(),
            actual: calc_new_root.to_hex(),
        });
    }

    // Covers the suffix root and the proof length
    let expected = prove_consistency(scheme, old_leaves, new_leaves)?;
    if expected.hashes != proof_hashes {
        tracing::warn!(
            expected = expected.hashes.len(),
            actual = proof_hashes.len(),
            "consistency proof entries do not match the recomputed proof"
        );
        return Err(Error::InvalidProof(
            "proof entries do not match the recomputed proof".to_string(),
        ));
    }

    Ok(())
}
