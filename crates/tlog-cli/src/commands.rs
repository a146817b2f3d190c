//! Command implementations
//!
//! Each command writes its result to `out`. A negative answer ("no", "invalid")
//! is a normal result; only I/O, malformed files and similar failures are
//! returned as errors.

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tlog_merkle::{
    check_inclusion, verify_inclusion_proof, ConsistencyProof, Error, InclusionProof, MerkleTree,
    Sha256Hash,
};

use crate::cli::Command;
use crate::config::{Config, OutputFormat};
use crate::error::Result;

/// Run one command
pub fn run(command: &Command, config: &Config, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Build { tree_file, items } => build(config, tree_file, items, out),
        Command::CheckInclusion { tree_file, item } => {
            check_inclusion_cmd(config, tree_file, item, out)
        }
        Command::VerifyInclusion {
            root,
            index,
            size,
            proof,
            item,
        } => verify_inclusion(config, root, *index, *size, proof, item, out),
        Command::CheckConsistency {
            old_file,
            new_file,
            old,
            new,
        } => check_consistency_cmd(config, old_file, new_file, old, new, out),
    }
}

#[derive(Serialize)]
struct BuildReport<'a> {
    tree_file: &'a Path,
    root: Sha256Hash,
    leaves: u64,
}

fn build(config: &Config, tree_file: &Path, items: &[String], out: &mut impl Write) -> Result<()> {
    let tree = MerkleTree::from_items(config.scheme, items.iter().map(String::as_str))?;
    tree.save(tree_file)?;

    match config.output {
        OutputFormat::Text => {
            writeln!(
                out,
                "Merkle Tree successfully built and saved to {}",
                tree_file.display()
            )?;
            writeln!(out, "root: {}", tree.root())?;
        }
        OutputFormat::Json => write_json(
            out,
            &BuildReport {
                tree_file,
                root: tree.root(),
                leaves: tree.size(),
            },
        )?,
    }
    Ok(())
}

#[derive(Serialize)]
struct InclusionReport<'a> {
    included: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    root: Option<Sha256Hash>,
    #[serde(flatten)]
    proof: Option<&'a InclusionProof>,
}

fn check_inclusion_cmd(
    config: &Config,
    tree_file: &Path,
    item: &str,
    out: &mut impl Write,
) -> Result<()> {
    // Load failures are adapter errors, not a "no"
    let tree = MerkleTree::load(tree_file)?;

    let proof = match check_inclusion(&tree, item) {
        Ok(proof) => Some(proof),
        Err(Error::TargetNotFound(hash)) => {
            tracing::info!(%hash, "item not in tree");
            None
        }
        Err(e) => return Err(e.into()),
    };

    match config.output {
        OutputFormat::Text => match &proof {
            Some(proof) => writeln!(out, "yes {}", format_hashes(&proof.hashes))?,
            None => writeln!(out, "no")?,
        },
        OutputFormat::Json => write_json(
            out,
            &InclusionReport {
                included: proof.is_some(),
                root: proof.as_ref().map(|_| tree.root()),
                proof: proof.as_ref(),
            },
        )?,
    }
    Ok(())
}

#[derive(Serialize)]
struct VerificationReport {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

fn verify_inclusion(
    config: &Config,
    root: &Sha256Hash,
    index: u64,
    size: u64,
    proof: &[Sha256Hash],
    item: &str,
    out: &mut impl Write,
) -> Result<()> {
    let leaf_hash = config.scheme.hash_leaf(item.as_bytes());
    let result = verify_inclusion_proof(config.scheme, &leaf_hash, index, size, proof, root);

    let report = VerificationReport {
        valid: result.is_ok(),
        reason: result.err().map(|e| e.to_string()),
    };
    match config.output {
        OutputFormat::Text => match &report.reason {
            None => writeln!(out, "valid")?,
            Some(reason) => writeln!(out, "invalid: {}", reason)?,
        },
        OutputFormat::Json => write_json(out, &report)?,
    }
    Ok(())
}

#[derive(Serialize)]
struct ConsistencyReport<'a> {
    consistent: bool,
    #[serde(flatten)]
    proof: Option<&'a ConsistencyProof>,
}

fn check_consistency_cmd(
    config: &Config,
    old_file: &Path,
    new_file: &Path,
    old: &[String],
    new: &[String],
    out: &mut impl Write,
) -> Result<()> {
    MerkleTree::from_items(config.scheme, old.iter().map(String::as_str))?.save(old_file)?;
    MerkleTree::from_items(config.scheme, new.iter().map(String::as_str))?.save(new_file)?;

    // The check runs on the trees as persisted
    let old_tree = MerkleTree::load(old_file)?;
    let new_tree = MerkleTree::load(new_file)?;

    let proof = match old_tree.prove_consistency_to(&new_tree) {
        Ok(proof) => {
            proof.verify(
                old_tree.scheme(),
                &old_tree.root(),
                &new_tree.root(),
                old_tree.leaf_hashes(),
                new_tree.leaf_hashes(),
            )?;
            Some(proof)
        }
        Err(Error::NotConsistentPrefix(reason)) => {
            tracing::info!(%reason, "trees are not consistent");
            None
        }
        Err(e) => return Err(e.into()),
    };

    match config.output {
        OutputFormat::Text => match &proof {
            Some(proof) => writeln!(out, "yes {}", format_hashes(&proof.hashes))?,
            None => writeln!(out, "no")?,
        },
        OutputFormat::Json => write_json(
            out,
            &ConsistencyReport {
                consistent: proof.is_some(),
                proof: proof.as_ref(),
            },
        )?,
    }
    Ok(())
}

/// Render hashes as `['<hex>', '<hex>']`
fn format_hashes(hashes: &[Sha256Hash]) -> String {
    let quoted: Vec<String> = hashes.iter().map(|h| format!("'{}'", h)).collect();
    format!("[{}]", quoted.join(", "))
}

fn write_json(out: &mut impl Write, value: &impl Serialize) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_hashes() {
        assert_eq!(format_hashes(&[]), "[]");
        let a = Sha256Hash::from_bytes([0xab; 32]);
        let b = Sha256Hash::from_bytes([0x01; 32]);
        assert_eq!(
            format_hashes(&[a, b]),
            format!("['{}', '{}']", "ab".repeat(32), "01".repeat(32))
        );
    }
}
