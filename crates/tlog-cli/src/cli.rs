//! Command-line arguments

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tlog_merkle::{HashScheme, Sha256Hash, DEFAULT_TREE_FILE};

/// Default file for the older tree written by `check-consistency`
pub const DEFAULT_OLD_TREE_FILE: &str = "old_merkle.tree";

/// Default file for the newer tree written by `check-consistency`
pub const DEFAULT_NEW_TREE_FILE: &str = "new_merkle.tree";

/// Build Merkle trees and check inclusion and consistency proofs
#[derive(Debug, Parser)]
#[command(name = "tlog", version, about)]
pub struct Cli {
    /// Hashing scheme for leaves and nodes
    #[arg(
        long,
        global = true,
        value_enum,
        env = "TLOG_HASH_SCHEME",
        default_value_t = SchemeArg::Legacy
    )]
    pub scheme: SchemeArg,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build a tree from the given items and save it
    Build {
        /// Output file
        #[arg(long, env = "TLOG_TREE_FILE", default_value = DEFAULT_TREE_FILE)]
        tree_file: PathBuf,

        /// Items, in log order
        #[arg(required = true)]
        items: Vec<String>,
    },

    /// Print the inclusion proof for an item of a saved tree
    CheckInclusion {
        /// Tree file to read
        #[arg(long, env = "TLOG_TREE_FILE", default_value = DEFAULT_TREE_FILE)]
        tree_file: PathBuf,

        /// Item to look up
        item: String,
    },

    /// Verify an inclusion proof without access to the tree
    VerifyInclusion {
        /// Expected root hash (hex)
        #[arg(long)]
        root: Sha256Hash,

        /// Index of the leaf
        #[arg(long)]
        index: u64,

        /// Number of leaves in the tree
        #[arg(long)]
        size: u64,

        /// Proof hashes (hex), leaf level first
        #[arg(long = "proof")]
        proof: Vec<Sha256Hash>,

        /// Item the proof is for
        item: String,
    },

    /// Check that the old item list is a prefix of the new one: OLD... -- NEW...
    CheckConsistency {
        /// File for the older tree
        #[arg(long, default_value = DEFAULT_OLD_TREE_FILE)]
        old_file: PathBuf,

        /// File for the newer tree
        #[arg(long, default_value = DEFAULT_NEW_TREE_FILE)]
        new_file: PathBuf,

        /// Items of the older tree
        #[arg(required = true)]
        old: Vec<String>,

        /// Items of the newer tree
        #[arg(last = true, required = true)]
        new: Vec<String>,
    },
}

/// `--scheme` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemeArg {
    /// SHA256 over the hex text of both children, no prefixes
    Legacy,
    /// RFC 6962 style 0x00 / 0x01 prefixes
    DomainSeparated,
}

impl From<SchemeArg> for HashScheme {
    fn from(arg: SchemeArg) -> Self {
        match arg {
            SchemeArg::Legacy => HashScheme::Legacy,
            SchemeArg::DomainSeparated => HashScheme::DomainSeparated,
        }
    }
}

/// Exit status for an argument parsing failure
///
/// `--help` and `--version` also surface as parse errors but are not
/// failures; everything else is a usage error and exits 1.
pub fn usage_exit_code(err: &clap::Error) -> u8 {
    if err.use_stderr() {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_consistency_lists() {
        let cli = Cli::try_parse_from([
            "tlog",
            "check-consistency",
            "alice",
            "bob",
            "--",
            "alice",
            "bob",
            "carol",
        ])
        .unwrap();
        match cli.command {
            Command::CheckConsistency { old, new, .. } => {
                assert_eq!(old, vec!["alice", "bob"]);
                assert_eq!(new, vec!["alice", "bob", "carol"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_scheme() {
        let cli = Cli::try_parse_from(["tlog", "--scheme", "domain-separated", "build", "a"])
            .unwrap();
        assert_eq!(HashScheme::from(cli.scheme), HashScheme::DomainSeparated);
    }

    #[test]
    fn test_build_requires_items() {
        assert!(Cli::try_parse_from(["tlog", "build"]).is_err());
    }

    #[test]
    fn test_verify_inclusion_rejects_bad_hex() {
        let result = Cli::try_parse_from([
            "tlog",
            "verify-inclusion",
            "--root",
            "xyz",
            "--index",
            "0",
            "--size",
            "1",
            "alice",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_usage_exit_code() {
        let exit_code = |args: &[&str]| usage_exit_code(&Cli::try_parse_from(args).unwrap_err());

        assert_eq!(exit_code(&["tlog", "--help"]), 0);
        assert_eq!(exit_code(&["tlog", "build", "--help"]), 0);
        assert_eq!(exit_code(&["tlog", "--version"]), 0);

        assert_eq!(exit_code(&["tlog"]), 1);
        assert_eq!(exit_code(&["tlog", "build"]), 1);
        assert_eq!(exit_code(&["tlog", "frobnicate"]), 1);
        assert_eq!(
            exit_code(&[
                "tlog",
                "verify-inclusion",
                "--root",
                "xyz",
                "--index",
                "0",
                "--size",
                "1",
                "a",
            ]),
            1
        );
    }
}
