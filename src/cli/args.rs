use std::path::PathBuf;

use clap::Parser;

/// Running without arguments performs a full recovery with built-in paths.
#[derive(Parser, Debug)]
#[command(name = "userrescue", disable_version_flag = true)]
pub struct Cli {
    /// YAML file overriding backupRoot, scratchMount, dataDir, settleSeconds, syncSeconds
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Echo external commands and enable debug logging on stderr
    #[arg(long, short = 'v')]
    pub verbose: bool,

    #[arg(long)]
    pub version: bool,
}
