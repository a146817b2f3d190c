//! Settings resolved from the command line and environment

use tlog_merkle::HashScheme;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

/// How command results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `yes [...]` / `no` lines
    #[default]
    Text,
    /// One JSON document per command
    Json,
}

/// Settings shared by every command
#[derive(Debug, Clone)]
pub struct Config {
    /// Hashing scheme for newly built trees
    pub scheme: HashScheme,
    /// Output format
    pub output: OutputFormat,
    /// Default log directive when `RUST_LOG` is unset
    pub log_level: &'static str,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scheme: HashScheme::default(),
            output: OutputFormat::default(),
            log_level: "warn",
        }
    }
}

impl Config {
    /// Resolve settings from parsed arguments
    pub fn from_cli(cli: &Cli) -> Self {
        let log_level = match (cli.quiet, cli.verbose) {
            (true, _) => "error",
            (false, 0) => "warn",
            (false, 1) => "info",
            (false, _) => "debug",
        };
        Self {
            scheme: cli.scheme.into(),
            output: if cli.json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            },
            log_level,
        }
    }

    /// Use the given hashing scheme
    pub fn with_scheme(mut self, scheme: HashScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Print JSON instead of text
    pub fn with_json_output(mut self) -> Self {
        self.output = OutputFormat::Json;
        self
    }

    /// Install the stderr tracing subscriber
    ///
    /// `RUST_LOG` takes precedence over the verbosity flags.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.log_level));
        // A subscriber may already be installed (e.g. by tests)
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
            .try_init();
    }
}
