//! tlog command-line tool
//!
//! Usage:
//!   tlog build alice bob carol david
//!   tlog check-inclusion bob
//!   tlog check-consistency alice bob carol -- alice bob carol david eve

use std::process::ExitCode;

use clap::Parser;
use tlog_cli::cli::usage_exit_code;
use tlog_cli::{run, Cli, Config};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(usage_exit_code(&e));
        }
    };
    let config = Config::from_cli(&cli);
    config.init_logging();

    let stdout = std::io::stdout();
    match run(&cli.command, &config, &mut stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("Operation failed:\n{}", e);
            ExitCode::FAILURE
        }
    }
}
