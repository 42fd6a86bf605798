//! Block-device topology queries.
//!
//! `lsblk` JSON is the only place raw system output is parsed; everything
//! above this module works with normalized [`BlockDevice`] snapshots.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use tracing::debug;

use crate::disk::{BlockDevice, DeviceKind};
use crate::error::{Result, RescueError};
use crate::types::RunMode;
use crate::util::command::capture_stdout;

const LSBLK_COLUMNS: &str = "PATH,TYPE,SIZE,FSAVAIL,HOTPLUG,MOUNTPOINT";

/// Read-only view of the machine's block devices.
pub trait Inspector {
    /// Device node backing the filesystem mounted at `/`.
    fn query_root_source(&self) -> Result<PathBuf>;

    /// Full hierarchy, or the subtree rooted at `filter` when given.
    fn query_devices(&self, filter: Option<&Path>) -> Result<Vec<BlockDevice>>;

    fn query_device(&self, path: &Path) -> Result<BlockDevice> {
        self.query_devices(Some(path))?
            .into_iter()
            .next()
            .ok_or_else(|| RescueError::query(format!("no block device reported for {}", path.display())))
    }

    fn query_available_space(&self, path: &Path) -> Result<u64> {
        self.query_device(path)?.available.ok_or_else(|| {
            RescueError::query(format!(
                "{} has no mounted filesystem; available space unknown",
                path.display()
            ))
        })
    }
}

/// Inspector backed by util-linux `lsblk` and `findmnt`.
pub struct Lsblk {
    run_mode: RunMode,
}

impl Lsblk {
    pub fn new(run_mode: RunMode) -> Self {
        Self { run_mode }
    }
}

impl Inspector for Lsblk {
    fn query_root_source(&self) -> Result<PathBuf> {
        let mut cmd = Command::new("findmnt");
        cmd.arg("-no").arg("SOURCE").arg("/");
        let stdout = capture_stdout(&mut cmd, self.run_mode)?;
        parse_root_source(&stdout)
    }

    fn query_devices(&self, filter: Option<&Path>) -> Result<Vec<BlockDevice>> {
        let mut cmd = Command::new("lsblk");
        cmd.arg("-J").arg("-b").arg("-o").arg(LSBLK_COLUMNS);
        if let Some(path) = filter {
            cmd.arg(path);
        }
        let stdout = capture_stdout(&mut cmd, self.run_mode)?;
        let devices = parse_lsblk(&stdout)?;
        debug!(count = devices.len(), filter = ?filter, "lsblk topology");
        Ok(devices)
    }
}

pub fn parse_root_source(stdout: &str) -> Result<PathBuf> {
    let line = stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| RescueError::query("findmnt produced no output"))?;
    // btrfs reports the subvolume as "/dev/sda2[/@]"
    let source = match line.find('[') {
        Some(pos) => &line[..pos],
        None => line,
    };
    if !source.starts_with('/') || source.contains(char::is_whitespace) {
        return Err(RescueError::query(format!(
            "findmnt reported unexpected root source {:?}",
            line
        )));
    }
    Ok(PathBuf::from(source))
}

#[derive(Debug, Deserialize)]
struct LsblkOutput {
    blockdevices: Vec<LsblkDevice>,
}

#[derive(Debug, Deserialize)]
struct LsblkDevice {
    path: Option<String>,
    #[serde(rename = "type")]
    device_type: Option<String>,
    #[serde(default)]
    size: Option<Scalar>,
    #[serde(default)]
    fsavail: Option<Scalar>,
    #[serde(default)]
    hotplug: Option<Scalar>,
    #[serde(default)]
    mountpoint: Option<String>,
    #[serde(default)]
    children: Vec<LsblkDevice>,
}

/// util-linux 2.33 through 2.36 has the PATH column but still prints
/// sizes as JSON strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Number(u64),
    Text(String),
}

impl Scalar {
    fn as_u64(&self, field: &str, path: &str) -> Result<u64> {
        match self {
            Scalar::Number(n) => Ok(*n),
            Scalar::Text(s) => s.trim().parse::<u64>().map_err(|_| {
                RescueError::query(format!("lsblk {} of {} is not an integer: {:?}", field, path, s))
            }),
            Scalar::Bool(b) => Err(RescueError::query(format!(
                "lsblk {} of {} is not an integer: {}",
                field, path, b
            ))),
        }
    }

    fn as_bool(&self, field: &str, path: &str) -> Result<bool> {
        match self {
            Scalar::Bool(b) => Ok(*b),
            Scalar::Number(0) => Ok(false),
            Scalar::Number(1) => Ok(true),
            Scalar::Text(s) if s.trim() == "0" => Ok(false),
            Scalar::Text(s) if s.trim() == "1" => Ok(true),
            other => Err(RescueError::query(format!(
                "lsblk {} of {} is not a flag: {:?}",
                field, path, other
            ))),
        }
    }
}

pub fn parse_lsblk(stdout: &str) -> Result<Vec<BlockDevice>> {
    if stdout.trim().is_empty() {
        return Err(RescueError::query("lsblk produced no output"));
    }
    let output: LsblkOutput = serde_json::from_str(stdout)
        .map_err(|e| RescueError::query(format!("parse lsblk output: {}", e)))?;
    output
        .blockdevices
        .into_iter()
        .map(|raw| convert(raw).map(BlockDevice::normalize))
        .collect()
}

fn convert(raw: LsblkDevice) -> Result<BlockDevice> {
    let path = raw
        .path
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| RescueError::query("lsblk device without path (util-linux too old?)"))?;
    let kind = raw
        .device_type
        .as_deref()
        .map(DeviceKind::from_str)
        .ok_or_else(|| RescueError::query(format!("lsblk {} has no type", path)))?;
    let size = raw
        .size
        .as_ref()
        .ok_or_else(|| RescueError::query(format!("lsblk {} has no size", path)))?
        .as_u64("size", &path)?;
    let available = raw
        .fsavail
        .as_ref()
        .map(|v| v.as_u64("fsavail", &path))
        .transpose()?;
    let hotplug = raw
        .hotplug
        .as_ref()
        .map(|v| v.as_bool("hotplug", &path))
        .transpose()?
        .unwrap_or(false);
    let mountpoint = raw
        .mountpoint
        .filter(|m| !m.trim().is_empty())
        .map(PathBuf::from);
    let children = raw
        .children
        .into_iter()
        .map(convert)
        .collect::<Result<Vec<_>>>()?;
    Ok(BlockDevice {
        path: PathBuf::from(path),
        kind,
        size,
        available,
        hotplug,
        mountpoint,
        children,
    })
}
