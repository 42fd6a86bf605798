pub mod lsblk;
pub mod target;

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceKind {
    Disk,
    Partition,
    Other(String),
}

impl DeviceKind {
    pub fn from_str(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "disk" => DeviceKind::Disk,
            "part" | "partition" => DeviceKind::Partition,
            other => DeviceKind::Other(other.to_string()),
        }
    }
}

/// Snapshot of one disk or partition as reported by a single query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDevice {
    pub path: PathBuf,
    pub kind: DeviceKind,
    /// Total size in bytes.
    pub size: u64,
    /// Filesystem-level free bytes; only known while mounted.
    pub available: Option<u64>,
    pub hotplug: bool,
    pub mountpoint: Option<PathBuf>,
    pub children: Vec<BlockDevice>,
}

impl BlockDevice {
    pub fn is_disk(&self) -> bool {
        self.kind == DeviceKind::Disk
    }

    /// Depth-first search of this device and its children.
    pub fn find(&self, path: &Path) -> Option<&BlockDevice> {
        if self.path == path {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(path))
    }

    /// Enforces the disk/partition shape: disks keep only partitions,
    /// partitions keep nothing.
    pub(crate) fn normalize(mut self) -> Self {
        match self.kind {
            DeviceKind::Disk => {
                self.children = self
                    .children
                    .into_iter()
                    .filter(|child| child.kind == DeviceKind::Partition)
                    .map(BlockDevice::normalize)
                    .collect();
            }
            DeviceKind::Partition => self.children.clear(),
            DeviceKind::Other(_) => {
                self.children = self.children.into_iter().map(BlockDevice::normalize).collect();
            }
        }
        self
    }
}

pub fn find_in<'a>(devices: &'a [BlockDevice], path: &Path) -> Option<&'a BlockDevice> {
    devices.iter().find_map(|device| device.find(path))
}
