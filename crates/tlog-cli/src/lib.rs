//! Command-line adapter for tlog-merkle
//!
//! Argument parsing, settings, logging setup and output formatting for the
//! `tlog` binary. Commands write to any [`std::io::Write`] so they can be run
//! against a buffer.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::{Cli, Command, SchemeArg};
pub use commands::run;
pub use config::{Config, OutputFormat};
pub use error::{CliError, Result};
