use std::path::Path;
use std::process::Command;

use crate::error::Result;
use crate::types::RunMode;
use crate::util::command::run_command;

/// Recursive copy and buffer flush. Exit codes are returned as-is; the
/// orchestrator decides what counts as success.
pub trait Copier {
    /// Copies the directory `source` into `dest`, producing
    /// `dest/<source name>`.
    fn copy_tree(&self, source: &Path, dest: &Path) -> Result<i32>;
    fn sync(&self) -> Result<i32>;
}

pub struct SystemCopier {
    run_mode: RunMode,
}

impl SystemCopier {
    pub fn new(run_mode: RunMode) -> Self {
        Self { run_mode }
    }
}

impl Copier for SystemCopier {
    fn copy_tree(&self, source: &Path, dest: &Path) -> Result<i32> {
        // -a keeps symlinks as links plus ownership, modes and timestamps
        let mut cmd = Command::new("cp");
        cmd.arg("-a").arg("-v").arg("--").arg(source).arg(dest);
        run_command(&mut cmd, self.run_mode)
    }

    fn sync(&self) -> Result<i32> {
        let mut cmd = Command::new("sync");
        run_command(&mut cmd, self.run_mode)
    }
}
