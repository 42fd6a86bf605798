use std::path::{Path, PathBuf};

use tracing::warn;

use crate::console;
use crate::disk::lsblk::Inspector;
use crate::error::Result;
use crate::mount::ops::Mounter;
use crate::mount::unmount;

/// Owns a mounted partition; unmounts it when dropped unless released.
pub struct MountGuard<'a> {
    inspector: &'a dyn Inspector,
    mounter: &'a dyn Mounter,
    device: PathBuf,
    mountpoint: PathBuf,
    armed: bool,
}

impl<'a> MountGuard<'a> {
    pub fn new(
        inspector: &'a dyn Inspector,
        mounter: &'a dyn Mounter,
        device: PathBuf,
        mountpoint: PathBuf,
    ) -> Self {
        Self {
            inspector,
            mounter,
            device,
            mountpoint,
            armed: true,
        }
    }

    pub fn device(&self) -> &Path {
        &self.device
    }

    pub fn mountpoint(&self) -> &Path {
        &self.mountpoint
    }

    /// Verified unmount for the success path.
    pub fn release(mut self) -> Result<()> {
        self.armed = false;
        unmount(self.inspector, self.mounter, &self.device)
    }
}

impl Drop for MountGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match unmount(self.inspector, self.mounter, &self.device) {
            Ok(()) => console::progress(format!("Unmounted {}", self.device.display())),
            Err(err) => {
                warn!(device = %self.device.display(), error = %err, "cleanup unmount failed");
                console::failure(format!(
                    "{} may still be mounted at {}; unmount it manually: {}",
                    self.device.display(),
                    self.mountpoint.display(),
                    err
                ));
            }
        }
    }
}
