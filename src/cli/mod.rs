use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::args::Cli;
use crate::cli::commands::recover;
use crate::types::RunMode;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const LICENSE_NAME: &str = "GNU GPL v3 or later";

pub mod args;
pub mod commands;

pub fn run() -> Result<()> {
    let cli = parse_cli();
    init_tracing(cli.verbose);

    if cli.version {
        print_banner();
        println!("License: {}", LICENSE_NAME);
        return Ok(());
    }

    let run_mode = RunMode {
        verbose: cli.verbose,
    };
    recover::run_recover_command(cli.config.as_deref(), run_mode)
}

fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                print_banner();
                let _ = err.print();
                std::process::exit(0);
            }
            println!("{}", err);
            std::process::exit(2);
        }
    }
}

fn print_banner() {
    println!("UserRescue {}", VERSION);
}

/// Logs go to stderr; stdout carries the operator transcript.
fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
