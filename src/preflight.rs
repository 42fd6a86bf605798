use std::collections::HashSet;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Result, RescueError};
use crate::util::paths::is_real_dir;

pub const GIB: u64 = 1024 * 1024 * 1024;

/// Free space that must remain on the destination after the copy.
pub const SAFETY_MARGIN: u64 = GIB;

/// `st_blocks` is always counted in 512-byte units.
const BLOCK_UNIT: u64 = 512;

pub fn to_gib(bytes: u64) -> f64 {
    bytes as f64 / GIB as f64
}

/// Returns `<mount_point>/<data_dir>` if it is a directory on the mounted
/// filesystem. A symlink there would resolve on the host and is refused.
pub fn verify_data_directory(mount_point: &Path, data_dir: &str) -> Result<PathBuf> {
    let path = mount_point.join(data_dir);
    if !is_real_dir(&path) {
        return Err(RescueError::MissingData {
            dir: data_dir.to_string(),
            mount: mount_point.to_path_buf(),
        });
    }
    Ok(path)
}

/// Physical space used by a directory tree, the way `du -s` counts it:
/// allocated blocks rather than file length, each inode once, symlinks
/// not followed.
pub fn measure_directory_size(root: &Path) -> Result<u64> {
    let mut seen: HashSet<(u64, u64)> = HashSet::new();
    let mut total = 0u64;
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() > 0 => {
                warn!(error = %err, "skipping unreadable entry");
                continue;
            }
            Err(err) => {
                return Err(RescueError::message(format!("read {}: {}", root.display(), err)))
            }
        };
        let meta = match entry.metadata() {
            Ok(meta) => meta,
            Err(err) => {
                warn!(path = %entry.path().display(), error = %err, "skipping entry without metadata");
                continue;
            }
        };
        if meta.nlink() > 1 && !meta.is_dir() && !seen.insert((meta.dev(), meta.ino())) {
            continue;
        }
        total = total.saturating_add(meta.blocks().saturating_mul(BLOCK_UNIT));
    }
    debug!(root = %root.display(), bytes = total, "measured");
    Ok(total)
}

/// Remaining destination space after the copy; fails unless it exceeds the
/// safety margin.
pub fn check_sufficient_space(source_available: u64, target_size: u64) -> Result<u64> {
    match source_available.checked_sub(target_size) {
        Some(remaining) if remaining > SAFETY_MARGIN => Ok(remaining),
        _ => Err(RescueError::InsufficientSpace {
            required_gib: to_gib(target_size),
            available_gib: to_gib(source_available),
        }),
    }
}
