use std::fs;
use std::path::Path;

use crate::error::{Result, RescueError};

pub fn is_safe_name(name: &str) -> bool {
    if name.is_empty() || name == "." || name == ".." {
        return false;
    }
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

/// A single path segment that cannot climb out of its parent.
pub fn is_safe_component(name: &str) -> bool {
    !(name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\0'))
}

/// True only for a directory itself; a symlink to a directory is not one.
pub fn is_real_dir(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|meta| meta.file_type().is_dir())
        .unwrap_or(false)
}

/// `mkdir -p` followed by a check that a directory is really there.
pub fn create_dir_verified(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .map_err(|e| RescueError::message(format!("create {}: {}", path.display(), e)))?;
    let meta = fs::metadata(path)
        .map_err(|e| RescueError::message(format!("stat {}: {}", path.display(), e)))?;
    if !meta.is_dir() {
        return Err(RescueError::message(format!(
            "{} is not a directory",
            path.display()
        )));
    }
    Ok(())
}
