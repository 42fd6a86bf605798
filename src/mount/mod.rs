pub mod guard;
pub mod ops;

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::disk::lsblk::Inspector;
use crate::error::{DiskError, RescueError, Result};
use crate::mount::guard::MountGuard;
use crate::mount::ops::Mounter;
use crate::util::paths::create_dir_verified;

/// Unmounts every partition in order. Partitions that are not mounted are
/// skipped; partitions that stay mounted are reported after all attempts.
pub fn unmount_all(inspector: &dyn Inspector, mounter: &dyn Mounter, parts: &[PathBuf]) -> Result<()> {
    let mut failures = Vec::new();
    for part in parts {
        match unmount(inspector, mounter, part) {
            Ok(()) => {}
            Err(RescueError::Disk(DiskError::UmountFailure(reason))) => {
                warn!(device = %part.display(), reason = %reason, "unmount failed");
                failures.push(reason);
            }
            Err(err) => {
                warn!(device = %part.display(), error = %err, "unmount failed");
                failures.push(format!("{}: {}", part.display(), err));
            }
        }
    }
    if !failures.is_empty() {
        return Err(DiskError::UmountFailure(failures.join("; ")).into());
    }
    Ok(())
}

/// Unmounts one partition and confirms its mountpoint is gone.
pub fn unmount(inspector: &dyn Inspector, mounter: &dyn Mounter, device: &Path) -> Result<()> {
    let before = inspector.query_device(device)?;
    let Some(mountpoint) = before.mountpoint else {
        debug!(device = %device.display(), "not mounted");
        return Ok(());
    };
    let rc = mounter.unmount(device)?;
    let after = inspector.query_device(device)?;
    if let Some(still) = after.mountpoint {
        return Err(DiskError::UmountFailure(format!(
            "{} still mounted at {} (exit code {}); is it in use?",
            device.display(),
            still.display(),
            rc
        ))
        .into());
    }
    if rc != 0 {
        warn!(device = %device.display(), rc, "umount exited non-zero but device is unmounted");
    }
    info!(device = %device.display(), from = %mountpoint.display(), "unmounted");
    Ok(())
}

/// Mounts `device` at the fixed scratch directory and confirms the mount
/// took effect by re-querying the device.
pub fn mount<'a>(
    inspector: &'a dyn Inspector,
    mounter: &'a dyn Mounter,
    device: &Path,
    scratch: &Path,
) -> Result<MountGuard<'a>> {
    inspector
        .query_device(device)
        .map_err(|e| DiskError::Vanished(format!("{} ({})", device.display(), e)))?;

    create_dir_verified(scratch)?;
    let devices = inspector.query_devices(None)?;
    if let Some(holder) = find_mounted_at(&devices, scratch) {
        return Err(DiskError::MountFailure(format!(
            "mountpoint {} is already in use by {}",
            scratch.display(),
            holder.display()
        ))
        .into());
    }

    let rc = mounter.mount(device, scratch)?;
    let after = inspector
        .query_device(device)
        .map_err(|e| DiskError::Vanished(format!("{} ({})", device.display(), e)))?;
    match after.mountpoint.as_deref() {
        Some(mp) if mp == scratch => {}
        Some(other) => {
            return Err(DiskError::MountFailure(format!(
                "{} is mounted at {} instead of {} (exit code {})",
                device.display(),
                other.display(),
                scratch.display(),
                rc
            ))
            .into());
        }
        None => {
            return Err(DiskError::MountFailure(format!(
                "{} is not mounted after mounting at {} (exit code {})",
                device.display(),
                scratch.display(),
                rc
            ))
            .into());
        }
    }
    if rc != 0 {
        warn!(device = %device.display(), rc, "mount exited non-zero but device is mounted");
    }
    info!(device = %device.display(), mountpoint = %scratch.display(), "mounted");
    Ok(MountGuard::new(
        inspector,
        mounter,
        device.to_path_buf(),
        scratch.to_path_buf(),
    ))
}

fn find_mounted_at(devices: &[crate::disk::BlockDevice], mountpoint: &Path) -> Option<PathBuf> {
    for device in devices {
        if device.mountpoint.as_deref() == Some(mountpoint) {
            return Some(device.path.clone());
        }
        if let Some(found) = find_mounted_at(&device.children, mountpoint) {
            return Some(found);
        }
    }
    None
}
