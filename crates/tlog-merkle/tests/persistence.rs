//! Round-trips of trees through files on disk

use rstest::rstest;
use tempfile::TempDir;
use tlog_merkle::{Error, HashScheme, MerkleTree, DEFAULT_TREE_FILE};

#[rstest]
#[case(HashScheme::Legacy, &["alice"])]
#[case(HashScheme::Legacy, &["alice", "bob", "carol"])]
#[case(HashScheme::DomainSeparated, &["alice", "bob", "carol", "david", "eve"])]
fn test_save_and_load(#[case] scheme: HashScheme, #[case] items: &[&str]) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(DEFAULT_TREE_FILE);

    let tree = MerkleTree::from_items(scheme, items.iter().copied()).unwrap();
    tree.save(&path).unwrap();

    let loaded = MerkleTree::load(&path).unwrap();
    assert_eq!(loaded.root(), tree.root());
    assert_eq!(loaded.levels(), tree.levels());
    assert_eq!(loaded.scheme(), scheme);
    assert_eq!(loaded.leaves()[0].data.as_deref(), Some(items[0]));
}

#[test]
fn test_load_file_written_by_legacy_tool() {
    // Layout and indentation as produced for `alice bob`
    let json = r#"{
    "merkle_root": "92bb1b1e2b4fe6055b9acef6b11b355bf0c58f15aa7b1cde6e3dabec49d95174",
    "tree_structure": {
        "Level 0": [
            {
                "hash": "2bd806c97f0e00af1a1fc3328fa763a9269723c8db8fac4f93af71db186d6e90",
                "original_data": "alice"
            },
            {
                "hash": "81b637d8fcd2c6da6359e6963113a1170de795e4b725b84d1e0b4cfd9ec58ce9",
                "original_data": "bob"
            }
        ],
        "Level 1": [
            {
                "hash": "92bb1b1e2b4fe6055b9acef6b11b355bf0c58f15aa7b1cde6e3dabec49d95174"
            }
        ]
    }
}"#;
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("legacy.tree");
    std::fs::write(&path, json).unwrap();

    let tree = MerkleTree::load(&path).unwrap();
    assert_eq!(tree.scheme(), HashScheme::Legacy);
    assert_eq!(tree.size(), 2);

    let rebuilt = MerkleTree::from_items(HashScheme::Legacy, ["alice", "bob"]).unwrap();
    assert_eq!(tree, rebuilt);
    assert_eq!(rebuilt.to_json().unwrap(), json);
}

#[test]
fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = MerkleTree::load(dir.path().join("absent.tree"));
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_load_garbage_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("garbage.tree");
    std::fs::write(&path, "not json").unwrap();
    assert!(matches!(
        MerkleTree::load(&path),
        Err(Error::MalformedPersistedTree(_))
    ));
}
