use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use crate::config::model::{Config, RuntimeConfig};
use crate::error::{ConfigError, Result, RescueError};
use crate::util::paths::is_safe_name;

const DEFAULT_BACKUP_ROOT: &str = "/root/Customer_Backups";
const DEFAULT_SCRATCH_MOUNT: &str = "/mnt/VOLATILE";
const DEFAULT_DATA_DIR: &str = "Users";
const DEFAULT_SETTLE_SECONDS: u64 = 5;
const DEFAULT_SYNC_SECONDS: u64 = 3;

pub fn default_config() -> RuntimeConfig {
    RuntimeConfig {
        backup_root: PathBuf::from(DEFAULT_BACKUP_ROOT),
        scratch_mount: PathBuf::from(DEFAULT_SCRATCH_MOUNT),
        data_dir: DEFAULT_DATA_DIR.to_string(),
        settle_delay: Duration::from_secs(DEFAULT_SETTLE_SECONDS),
        sync_delay: Duration::from_secs(DEFAULT_SYNC_SECONDS),
    }
}

pub fn load_config(path: &Path) -> Result<RuntimeConfig> {
    let mut contents = String::new();
    File::open(path)
        .map_err(|e| RescueError::message(format!("open config {}: {}", path.display(), e)))?
        .read_to_string(&mut contents)
        .map_err(|e| RescueError::message(format!("read config {}: {}", path.display(), e)))?;
    let cfg: Config =
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
    parse_runtime(cfg)
}

fn absolute_path(field: &str, value: String) -> Result<PathBuf> {
    let path = PathBuf::from(value.trim());
    if !path.is_absolute() {
        return Err(ConfigError::Invalid(format!("{} must be an absolute path", field)).into());
    }
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(ConfigError::Invalid(format!("{} must not contain ..", field)).into());
    }
    if path == Path::new("/") {
        return Err(ConfigError::Invalid(format!("{} must not be /", field)).into());
    }
    Ok(path)
}

fn parse_runtime(cfg: Config) -> Result<RuntimeConfig> {
    let backup_root = absolute_path(
        "backupRoot",
        cfg.backup_root.unwrap_or_else(|| DEFAULT_BACKUP_ROOT.to_string()),
    )?;
    let scratch_mount = absolute_path(
        "scratchMount",
        cfg.scratch_mount.unwrap_or_else(|| DEFAULT_SCRATCH_MOUNT.to_string()),
    )?;
    if backup_root.starts_with(&scratch_mount) {
        return Err(ConfigError::Invalid(format!(
            "backupRoot {} must not be inside scratchMount {}",
            backup_root.display(),
            scratch_mount.display()
        ))
        .into());
    }
    let data_dir = cfg.data_dir.unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
    if !is_safe_name(&data_dir) {
        return Err(ConfigError::Invalid(format!(
            "dataDir {} must be a single name using only letters, digits, '.', '-', '_'",
            data_dir
        ))
        .into());
    }
    Ok(RuntimeConfig {
        backup_root,
        scratch_mount,
        data_dir,
        settle_delay: Duration::from_secs(cfg.settle_seconds.unwrap_or(DEFAULT_SETTLE_SECONDS)),
        sync_delay: Duration::from_secs(cfg.sync_seconds.unwrap_or(DEFAULT_SYNC_SECONDS)),
    })
}
