//! Persisted tree format
//!
//! Trees are stored as JSON with the root and every level, leaves first:
//!
//! ```text
//! {
//!     "merkle_root": "<hex>",
//!     "tree_structure": {
//!         "Level 0": [ { "hash": "<hex>", "original_data": "alice" }, ... ],
//!         "Level 1": [ { "hash": "<hex>" }, ... ],
//!         ...
//!     }
//! }
//! ```
//!
//! A `hash_scheme` field is written only for trees that do not use the legacy
//! scheme. Loading rebuilds the tree from level 0 and rejects any file whose
//! stored levels or root differ from the recomputation.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::ser::{Formatter, PrettyFormatter};
use tlog_types::Sha256Hash;

use crate::error::{Error, Result};
use crate::tree::{HashScheme, Leaf, MerkleTree};

/// Default file name for a persisted tree
pub const DEFAULT_TREE_FILE: &str = "merkle.tree";

const LEVEL_KEY_PREFIX: &str = "Level ";

/// One node of a persisted level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedNode {
    /// Node hash
    pub hash: Sha256Hash,
    /// Original item text (level 0 only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_data: Option<String>,
}

/// On-disk representation of a [`MerkleTree`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedTree {
    /// Root hash
    pub merkle_root: Sha256Hash,
    /// Levels from the leaves (index 0) up to the root
    #[serde(with = "level_map")]
    pub tree_structure: Vec<Vec<PersistedNode>>,
    /// Hashing scheme; absent means legacy
    #[serde(default, skip_serializing_if = "is_legacy")]
    pub hash_scheme: HashScheme,
}

fn is_legacy(scheme: &HashScheme) -> bool {
    *scheme == HashScheme::Legacy
}

impl PersistedTree {
    /// Capture a tree for persistence
    pub fn from_tree(tree: &MerkleTree) -> Self {
        let tree_structure = tree
            .levels()
            .iter()
            .enumerate()
            .map(|(level, hashes)| {
                hashes
                    .iter()
                    .enumerate()
                    .map(|(index, hash)| PersistedNode {
                        hash: *hash,
                        original_data: if level == 0 {
                            tree.leaves()[index].data.clone()
                        } else {
                            None
                        },
                    })
                    .collect()
            })
            .collect();

        Self {
            merkle_root: tree.root(),
            tree_structure,
            hash_scheme: tree.scheme(),
        }
    }

    /// Validate the persisted data and rebuild the tree from its leaves
    pub fn into_tree(self) -> Result<MerkleTree> {
        let mut levels = self.tree_structure.into_iter();
        let leaf_level = levels
            .next()
            .ok_or_else(|| malformed("tree has no levels"))?;
        if leaf_level.is_empty() {
            return Err(malformed("level 0 has no nodes"));
        }

        let leaves = leaf_level
            .into_iter()
            .map(|node| Leaf {
                hash: node.hash,
                data: node.original_data,
            })
            .collect();
        let tree = MerkleTree::from_leaves(self.hash_scheme, leaves)?;

        let stored: Vec<Vec<PersistedNode>> = levels.collect();
        if stored.len() + 1 != tree.levels().len() {
            return Err(malformed(format!(
                "expected {} levels for {} leaves, found {}",
                tree.levels().len(),
                tree.size(),
                stored.len() + 1
            )));
        }

        for (offset, (nodes, expected)) in stored.iter().zip(&tree.levels()[1..]).enumerate() {
            let level = offset + 1;
            if nodes.iter().any(|node| node.original_data.is_some()) {
                return Err(malformed(format!(
                    "level {} carries original data",
                    level
                )));
            }
            let hashes: Vec<Sha256Hash> = nodes.iter().map(|node| node.hash).collect();
            if &hashes != expected {
                return Err(malformed(format!(
                    "level {} does not match the recomputed hashes",
                    level
                )));
            }
        }

        if tree.root() != self.merkle_root {
            return Err(malformed(format!(
                "stored root {} does not match recomputed root {}",
                self.merkle_root,
                tree.root()
            )));
        }

        Ok(tree)
    }
}

fn malformed(message: impl Into<String>) -> Error {
    Error::MalformedPersistedTree(message.into())
}

impl MerkleTree {
    /// Serialize to pretty-printed JSON (four-space indent, ASCII only)
    pub fn to_json(&self) -> Result<String> {
        let persisted = PersistedTree::from_tree(self);
        let mut buf = Vec::new();
        let formatter = AsciiPrettyFormatter(PrettyFormatter::with_indent(b"    "));
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        persisted.serialize(&mut serializer)?;
        String::from_utf8(buf).map_err(|e| malformed(e.to_string()))
    }

    /// Parse and validate a persisted tree
    pub fn from_json(json: &str) -> Result<Self> {
        let persisted: PersistedTree =
            serde_json::from_str(json).map_err(|e| malformed(e.to_string()))?;
        persisted.into_tree()
    }

    /// Write the tree to `path`
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)?;
        tracing::info!(path = %path.display(), root = %self.root(), "saved Merkle tree");
        Ok(())
    }

    /// Read and validate a tree from `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let tree = Self::from_json(&content)?;
        tracing::info!(path = %path.display(), leaves = tree.size(), "loaded Merkle tree");
        Ok(tree)
    }
}

/// Pretty printer that writes every non-ASCII character (and DEL) as a
/// `\uXXXX` escape, using surrogate pairs outside the BMP
struct AsciiPrettyFormatter<'a>(PrettyFormatter<'a>);

impl Formatter for AsciiPrettyFormatter<'_> {
    fn begin_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_array(writer)
    }

    fn end_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_array(writer)
    }

    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_array_value(writer, first)
    }

    fn end_array_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_array_value(writer)
    }

    fn begin_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_object(writer)
    }

    fn end_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_object(writer)
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_object_key(writer, first)
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_object_value(writer)
    }

    fn end_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_object_value(writer)
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (index, ch) in fragment.char_indices() {
            if ch.is_ascii() && ch != '\x7f' {
                continue;
            }
            writer.write_all(fragment[start..index].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = index + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Serde helper writing levels as a `"Level N"` keyed map in ascending order
mod level_map {
    use std::fmt;

    use serde::de::{Error as DeError, MapAccess, Visitor};

    use super::*;

    pub fn serialize<S>(
        levels: &[Vec<PersistedNode>],
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(levels.len()))?;
        for (level, nodes) in levels.iter().enumerate() {
            map.serialize_entry(&format!("{}{}", LEVEL_KEY_PREFIX, level), nodes)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D>(
        deserializer: D,
    ) -> std::result::Result<Vec<Vec<PersistedNode>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(LevelMapVisitor)
    }

    struct LevelMapVisitor;

    impl<'de> Visitor<'de> for LevelMapVisitor {
        type Value = Vec<Vec<PersistedNode>>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map from \"Level N\" keys to node lists")
        }

        fn visit_map<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut numbered = BTreeMap::new();
            while let Some(key) = access.next_key::<String>()? {
                let level = parse_level_key(&key).ok_or_else(|| {
                    <A::Error as DeError>::custom(format!("unexpected level key {:?}", key))
                })?;
                if numbered.contains_key(&level) {
                    return Err(<A::Error as DeError>::custom(format!(
                        "duplicate entries for Level {}",
                        level
                    )));
                }
                let nodes: Vec<PersistedNode> = access.next_value()?;
                numbered.insert(level, nodes);
            }

            // Keys must be exactly Level 0..Level k
            if let Some((position, level)) = numbered
                .keys()
                .enumerate()
                .find(|(position, level)| position != *level)
            {
                return Err(<A::Error as DeError>::custom(format!(
                    "missing Level {} (next level present is {})",
                    position, level
                )));
            }

            Ok(numbered.into_values().collect())
        }
    }

    /// Level number of a canonical `"Level N"` key (no sign, no leading zeros)
    pub(super) fn parse_level_key(key: &str) -> Option<usize> {
        let digits = key.strip_prefix(LEVEL_KEY_PREFIX)?;
        let level = digits.parse::<usize>().ok()?;
        (level.to_string() == digits).then_some(level)
    }
}
