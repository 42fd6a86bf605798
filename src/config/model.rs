use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Optional overrides read from `--config`.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default, rename = "backupRoot")]
    pub backup_root: Option<String>,
    #[serde(default, rename = "scratchMount")]
    pub scratch_mount: Option<String>,
    #[serde(default, rename = "dataDir")]
    pub data_dir: Option<String>,
    #[serde(default, rename = "settleSeconds")]
    pub settle_seconds: Option<u64>,
    #[serde(default, rename = "syncSeconds")]
    pub sync_seconds: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Backups land in `<backup_root>/<customer>/<date>`.
    pub backup_root: PathBuf,
    /// Fixed scratch directory the target partition is mounted at.
    pub scratch_mount: PathBuf,
    /// Directory on the target that holds the user profiles.
    pub data_dir: String,
    /// Pause before the copy so the operator can check the target.
    pub settle_delay: Duration,
    /// Pause after `sync` before unmounting.
    pub sync_delay: Duration,
}
