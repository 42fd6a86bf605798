use std::io;
use std::path::Path;

use chrono::Local;

use crate::backup::copy::SystemCopier;
use crate::cli::commands::{exit_for_abort, exit_for_error};
use crate::config::load::{default_config, load_config};
use crate::console;
use crate::disk::lsblk::Lsblk;
use crate::mount::ops::SystemMounter;
use crate::recovery::{Recovery, RecoverySession};
use crate::types::RunMode;

pub fn run_recover_command(config_path: Option<&Path>, run_mode: RunMode) -> anyhow::Result<()> {
    let config = match config_path {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(err) => exit_for_error(&err),
        },
        None => default_config(),
    };
    if run_mode.verbose {
        println!(
            "backup root {}, scratch mount {}, data dir {}",
            config.backup_root.display(),
            config.scratch_mount.display(),
            config.data_dir
        );
    }

    let inspector = Lsblk::new(run_mode);
    let mounter = SystemMounter::new(run_mode);
    let copier = SystemCopier::new(run_mode);
    let today = Local::now().date_naive();
    let recovery = Recovery::new(&config, &inspector, &mounter, &copier, today);

    let stdin = io::stdin();
    let mut input = stdin.lock();
    match recovery.run(&mut input) {
        Ok(session) => {
            print_success(&session);
            Ok(())
        }
        Err(abort) => exit_for_abort(&abort),
    }
}

fn print_success(session: &RecoverySession) {
    println!();
    console::progress("Recovery successful, you may now remove the customer drive.");
    if let Some(dest) = &session.destination {
        console::progress(format!("The backup is located at {}", dest.display()));
    }
    println!();
    console::progress("Don't forget to put in your notes and call the customer...");
}
