use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{Result, RescueError};
use crate::types::RunMode;
use crate::util::command::run_command;

/// OS-level mount primitives. Both return the tool's exit code; callers
/// confirm the effect by re-querying the device.
pub trait Mounter {
    fn mount(&self, device: &Path, mountpoint: &Path) -> Result<i32>;
    fn unmount(&self, device: &Path) -> Result<i32>;
}

pub struct SystemMounter {
    run_mode: RunMode,
}

impl SystemMounter {
    pub fn new(run_mode: RunMode) -> Self {
        Self { run_mode }
    }
}

impl Mounter for SystemMounter {
    fn mount(&self, device: &Path, mountpoint: &Path) -> Result<i32> {
        let mut cmd = Command::new("mount");
        cmd.arg(device).arg(mountpoint);
        run_command(&mut cmd, self.run_mode)
            .map_err(|e| RescueError::message(format!("mount {}: {}", device.display(), e)))
    }

    fn unmount(&self, device: &Path) -> Result<i32> {
        let mut cmd = Command::new("umount");
        cmd.arg(device).stdout(Stdio::null());
        run_command(&mut cmd, self.run_mode)
            .map_err(|e| RescueError::message(format!("umount {}: {}", device.display(), e)))
    }
}
