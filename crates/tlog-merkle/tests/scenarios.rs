//! End-to-end scenarios over the legacy hashing scheme
//!
//! Root values were produced by the tool that wrote the existing `merkle.tree`
//! files, so these tests pin byte compatibility with it.

use rstest::rstest;
use tlog_merkle::{
    check_consistency, check_inclusion, verify_inclusion_proof, Error, HashScheme, MerkleTree,
    Sha256Hash,
};

const LEGACY: HashScheme = HashScheme::Legacy;

const R1: &str = "c73547b1ffacdea74edffa5972a04ebc76ab1798a29e596be3bb48e647c3492d";
const R2: &str = "3a91da9d9b55096228cc9f1a652df69c88fabf67b50b84d4e505bc1f24b618c3";
const R3: &str = "babc821f0e14d40de50fb7d53b8515e753eb2e7f93ef33477eeb45097766ae87";
const DAVID_EVE: &str = "f4c62a5b8158da17b90dcc2e599cc9a70bffad3d409021998f9934a0a842bd9a";
const CAROL_DAVID: &str = "2ef2284c556c42ce4caaef56fc24dec27044dc6bee27fbb3411722e5e0a1ca64";

fn hash(hex: &str) -> Sha256Hash {
    Sha256Hash::from_hex(hex).unwrap()
}

#[rstest]
#[case(&["alice", "bob", "carol", "david"], R1)]
#[case(&["alice", "bob", "carol"], R2)]
#[case(&["alice", "bob", "carol", "david", "eve"], R3)]
fn test_known_roots(#[case] items: &[&str], #[case] root: &str) {
    let tree = MerkleTree::from_items(LEGACY, items.iter().copied()).unwrap();
    assert_eq!(tree.root().to_hex(), root);
}

#[test]
fn test_four_leaves_have_two_levels_above() {
    let tree = MerkleTree::from_items(LEGACY, ["alice", "bob", "carol", "david"]).unwrap();
    assert_eq!(tree.size(), 4);
    assert_eq!(tree.levels().len(), 3);
    assert_eq!(tree.levels()[1][1], hash(CAROL_DAVID));
}

#[test]
fn test_odd_root_differs_from_carry_forward() {
    let tree = MerkleTree::from_items(LEGACY, ["alice", "bob", "carol"]).unwrap();
    let leaves = tree.leaf_hashes();

    // A carry-forward tree would promote carol unchanged to level 1
    let ab = LEGACY.hash_children(&leaves[0], &leaves[1]);
    let carried = LEGACY.hash_children(&ab, &leaves[2]);
    assert_ne!(tree.root(), carried);
}

#[test]
fn test_inclusion_of_bob() {
    let tree = MerkleTree::from_items(LEGACY, ["alice", "bob", "carol", "david"]).unwrap();
    let proof = check_inclusion(&tree, "bob").unwrap();

    assert_eq!(proof.leaf_index, 1);
    assert_eq!(
        proof.hashes,
        vec![LEGACY.hash_leaf(b"alice"), hash(CAROL_DAVID)]
    );

    let bob = LEGACY.hash_leaf(b"bob");
    assert!(proof.verify(LEGACY, &bob, &hash(R1)).is_ok());

    let mut tampered = hash(R1).as_bytes().to_owned();
    tampered[0] ^= 0x01;
    let result = proof.verify(LEGACY, &bob, &Sha256Hash::from_bytes(tampered));
    assert!(matches!(result, Err(Error::ProofMismatch { .. })));
}

#[test]
fn test_inclusion_of_absent_item() {
    let tree = MerkleTree::from_items(LEGACY, ["alice", "bob", "carol", "david"]).unwrap();
    assert!(matches!(
        check_inclusion(&tree, "mallory"),
        Err(Error::TargetNotFound(_))
    ));
}

#[test]
fn test_inclusion_of_carol_in_odd_tree() {
    let tree = MerkleTree::from_items(LEGACY, ["alice", "bob", "carol"]).unwrap();
    let proof = check_inclusion(&tree, "carol").unwrap();

    // carol is paired with itself on level 0, so only level 1 contributes
    assert_eq!(proof.hashes, vec![tree.levels()[1][0]]);
    let carol = LEGACY.hash_leaf(b"carol");
    assert!(verify_inclusion_proof(LEGACY, &carol, 2, 3, &proof.hashes, &hash(R2)).is_ok());
}

#[test]
fn test_consistency_append_two() {
    let old = ["alice", "bob", "carol"];
    let new = ["alice", "bob", "carol", "david", "eve"];
    let proof = check_consistency(LEGACY, &old, &new).unwrap();

    assert_eq!(proof.hashes, vec![hash(R2), hash(DAVID_EVE), hash(R3)]);
    assert_eq!(proof.old_root(), Some(&hash(R2)));
    assert_eq!(proof.new_root(), Some(&hash(R3)));
    assert_eq!((proof.old_size, proof.new_size), (3, 5));

    let old_tree = MerkleTree::from_items(LEGACY, old).unwrap();
    let new_tree = MerkleTree::from_items(LEGACY, new).unwrap();
    assert!(proof
        .verify(
            LEGACY,
            &hash(R2),
            &hash(R3),
            old_tree.leaf_hashes(),
            new_tree.leaf_hashes()
        )
        .is_ok());
}

#[rstest]
#[case(&["alice", "bob"], &["bob", "alice"])]
#[case(&["alice", "bob"], &["alice", "carol", "bob"])]
#[case(&["alice", "bob", "carol"], &["alice", "bob"])]
fn test_consistency_broken_prefix(#[case] old: &[&str], #[case] new: &[&str]) {
    assert!(matches!(
        check_consistency(LEGACY, old, new),
        Err(Error::NotConsistentPrefix(_))
    ));
}

#[test]
fn test_consistency_identical_lists() {
    let items = ["alice", "bob", "carol"];
    let proof = check_consistency(LEGACY, &items, &items).unwrap();
    assert_eq!(proof.hashes, vec![hash(R2)]);
}

#[test]
fn test_consistency_empty_old_list() {
    let empty: [&str; 0] = [];
    assert!(matches!(
        check_consistency(LEGACY, &empty, &["alice"]),
        Err(Error::EmptyInput)
    ));
}
