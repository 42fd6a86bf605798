use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::disk::lsblk::Inspector;
use crate::disk::BlockDevice;
use crate::error::{DiskError, Result};

/// The single hot-plugged disk among top-level devices.
pub fn find_target_disk(inspector: &dyn Inspector) -> Result<PathBuf> {
    let devices = inspector.query_devices(None)?;
    select_target_disk(&devices)
}

pub fn select_target_disk(devices: &[BlockDevice]) -> Result<PathBuf> {
    let candidates: Vec<&BlockDevice> = devices
        .iter()
        .filter(|device| device.is_disk() && device.hotplug)
        .collect();
    match candidates.as_slice() {
        [only] => {
            info!(disk = %only.path.display(), "target disk");
            Ok(only.path.clone())
        }
        [] => Err(DiskError::AmbiguousTarget("no hot-plugged disk connected".to_string()).into()),
        many => {
            let paths: Vec<String> = many.iter().map(|d| d.path.display().to_string()).collect();
            Err(DiskError::AmbiguousTarget(format!(
                "multiple hot-plugged disks connected ({}); connect only the customer drive",
                paths.join(", ")
            ))
            .into())
        }
    }
}

pub fn list_target_partitions(inspector: &dyn Inspector, disk: &Path) -> Result<Vec<PathBuf>> {
    let device = inspector.query_device(disk)?;
    let mut parts: Vec<PathBuf> = Vec::with_capacity(device.children.len());
    for child in device.children {
        if !parts.contains(&child.path) {
            parts.push(child.path);
        }
    }
    debug!(disk = %disk.display(), partitions = parts.len(), "target partitions");
    Ok(parts)
}

/// Largest partition by total size.
///
/// This is a size heuristic only: a large recovery or swap partition
/// outranks a smaller data partition. The data directory check after
/// mounting is what catches a wrong pick.
pub fn select_largest_partition(inspector: &dyn Inspector, parts: &[PathBuf]) -> Result<PathBuf> {
    let mut sizes = Vec::with_capacity(parts.len());
    for part in parts {
        sizes.push(inspector.query_device(part)?.size);
    }
    let index = largest_index(&sizes).ok_or(DiskError::NoPartitions)?;
    Ok(parts[index].clone())
}

/// Index of the first occurrence of the maximum.
pub fn largest_index(sizes: &[u64]) -> Option<usize> {
    let mut best: Option<(usize, u64)> = None;
    for (index, &size) in sizes.iter().enumerate() {
        match best {
            Some((_, current)) if size <= current => {}
            _ => best = Some((index, size)),
        }
    }
    best.map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RescueError;
    use crate::testing::{disk, part, FakeHost};

    #[test]
    fn single_hotplug_disk_is_selected() {
        let host = FakeHost::new(vec![
            disk("/dev/nvme0n1", false, vec![part("/dev/nvme0n1p1", 500)]),
            disk("/dev/sdb", true, vec![part("/dev/sdb1", 16)]),
        ]);
        assert_eq!(find_target_disk(&host).unwrap(), PathBuf::from("/dev/sdb"));
    }

    #[test]
    fn no_hotplug_disk_is_ambiguous() {
        let host = FakeHost::new(vec![disk("/dev/sda", false, Vec::new())]);
        let err = find_target_disk(&host).unwrap_err();
        assert!(matches!(err, RescueError::Disk(DiskError::AmbiguousTarget(_))));
    }

    #[test]
    fn two_hotplug_disks_are_ambiguous() {
        let host = FakeHost::new(vec![
            disk("/dev/sdb", true, Vec::new()),
            disk("/dev/sdc", true, Vec::new()),
        ]);
        let err = find_target_disk(&host).unwrap_err();
        assert!(err.to_string().contains("/dev/sdc"));
    }

    #[test]
    fn hotplug_partition_alone_is_not_a_disk() {
        let mut usb = part("/dev/sdd", 8);
        usb.hotplug = true;
        assert!(select_target_disk(&[usb]).is_err());
    }

    #[test]
    fn partitions_listed_in_reported_order() {
        let host = FakeHost::new(vec![disk(
            "/dev/sdb",
            true,
            vec![part("/dev/sdb2", 1), part("/dev/sdb1", 16)],
        )]);
        let parts = list_target_partitions(&host, Path::new("/dev/sdb")).unwrap();
        assert_eq!(parts, vec![PathBuf::from("/dev/sdb2"), PathBuf::from("/dev/sdb1")]);
    }

    #[test]
    fn largest_index_prefers_first_maximum() {
        assert_eq!(largest_index(&[]), None);
        assert_eq!(largest_index(&[7]), Some(0));
        assert_eq!(largest_index(&[1, 9, 3, 9]), Some(1));
        assert_eq!(largest_index(&[0, 0, 0]), Some(0));
        assert_eq!(largest_index(&[2, 3, 5]), Some(2));
    }

    #[test]
    fn largest_partition_is_selected() {
        let host = FakeHost::new(vec![disk(
            "/dev/sdb",
            true,
            vec![part("/dev/sdb1", 16), part("/dev/sdb2", 1), part("/dev/sdb3", 16)],
        )]);
        let parts = list_target_partitions(&host, Path::new("/dev/sdb")).unwrap();
        assert_eq!(
            select_largest_partition(&host, &parts).unwrap(),
            PathBuf::from("/dev/sdb1")
        );
    }

    #[test]
    fn empty_partition_list_is_an_error() {
        let host = FakeHost::new(Vec::new());
        let err = select_largest_partition(&host, &[]).unwrap_err();
        assert!(matches!(err, RescueError::Disk(DiskError::NoPartitions)));
    }
}
