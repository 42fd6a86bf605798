//! In-memory host for pipeline tests: a fixed device topology whose
//! mountpoints change as the fake mounter runs.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::backup::copy::Copier;
use crate::disk::lsblk::Inspector;
use crate::disk::{BlockDevice, DeviceKind};
use crate::error::{Result, RescueError};
use crate::mount::ops::Mounter;
use crate::preflight::GIB;

pub fn disk(path: &str, hotplug: bool, children: Vec<BlockDevice>) -> BlockDevice {
    let size = children.iter().map(|c| c.size).sum::<u64>() + GIB;
    let children = children
        .into_iter()
        .map(|mut child| {
            child.hotplug = hotplug;
            child
        })
        .collect();
    BlockDevice {
        path: PathBuf::from(path),
        kind: DeviceKind::Disk,
        size,
        available: None,
        hotplug,
        mountpoint: None,
        children,
    }
}

/// Partition of `gib` GiB.
pub fn part(path: &str, gib: u64) -> BlockDevice {
    BlockDevice {
        path: PathBuf::from(path),
        kind: DeviceKind::Partition,
        size: gib * GIB,
        available: None,
        hotplug: false,
        mountpoint: None,
        children: Vec::new(),
    }
}

/// Partition mounted at `/` with `available` free bytes.
pub fn root_part(path: &str, available: u64) -> BlockDevice {
    BlockDevice {
        path: PathBuf::from(path),
        kind: DeviceKind::Partition,
        size: 512 * GIB,
        available: Some(available),
        hotplug: false,
        mountpoint: Some(PathBuf::from("/")),
        children: Vec::new(),
    }
}

#[derive(Default)]
struct State {
    mounts: HashMap<PathBuf, PathBuf>,
    busy: HashSet<PathBuf>,
    contents: HashMap<PathBuf, Vec<(PathBuf, Vec<u8>)>>,
    fail_mounts: bool,
    fail_copies: bool,
    mount_calls: Vec<(PathBuf, PathBuf)>,
    unmount_calls: Vec<PathBuf>,
    sync_calls: usize,
}

pub struct FakeHost {
    devices: Vec<BlockDevice>,
    root: Option<PathBuf>,
    state: RefCell<State>,
}

impl FakeHost {
    pub fn new(devices: Vec<BlockDevice>) -> Self {
        let mut state = State::default();
        let mut pending: Vec<&BlockDevice> = devices.iter().collect();
        while let Some(device) = pending.pop() {
            if let Some(mp) = &device.mountpoint {
                state.mounts.insert(device.path.clone(), mp.clone());
            }
            pending.extend(device.children.iter());
        }
        Self {
            devices,
            root: None,
            state: RefCell::new(state),
        }
    }

    pub fn with_root(mut self, path: &str) -> Self {
        self.root = Some(PathBuf::from(path));
        self
    }

    /// Files that appear under the mountpoint whenever `device` is mounted.
    pub fn with_files(self, device: &str, files: &[(&str, &[u8])]) -> Self {
        self.state.borrow_mut().contents.insert(
            PathBuf::from(device),
            files
                .iter()
                .map(|(rel, bytes)| (PathBuf::from(rel), bytes.to_vec()))
                .collect(),
        );
        self
    }

    pub fn set_mounted(&self, device: &str, mountpoint: &Path) {
        self.state
            .borrow_mut()
            .mounts
            .insert(PathBuf::from(device), mountpoint.to_path_buf());
    }

    pub fn set_busy(&self, device: &str) {
        self.state.borrow_mut().busy.insert(PathBuf::from(device));
    }

    pub fn fail_mounts(&self) {
        self.state.borrow_mut().fail_mounts = true;
    }

    pub fn fail_copies(&self) {
        self.state.borrow_mut().fail_copies = true;
    }

    pub fn is_mounted(&self, device: &str) -> bool {
        self.state.borrow().mounts.contains_key(Path::new(device))
    }

    pub fn mount_calls(&self) -> Vec<(PathBuf, PathBuf)> {
        self.state.borrow().mount_calls.clone()
    }

    pub fn unmount_calls(&self) -> Vec<PathBuf> {
        self.state.borrow().unmount_calls.clone()
    }

    pub fn sync_calls(&self) -> usize {
        self.state.borrow().sync_calls
    }

    fn snapshot(&self, device: &BlockDevice, state: &State) -> BlockDevice {
        let mountpoint = state.mounts.get(&device.path).cloned();
        BlockDevice {
            available: mountpoint.as_ref().and(device.available),
            mountpoint,
            children: device
                .children
                .iter()
                .map(|child| self.snapshot(child, state))
                .collect(),
            ..device.clone()
        }
    }
}

impl Inspector for FakeHost {
    fn query_root_source(&self) -> Result<PathBuf> {
        self.root
            .clone()
            .ok_or_else(|| RescueError::query("findmnt produced no output"))
    }

    fn query_devices(&self, filter: Option<&Path>) -> Result<Vec<BlockDevice>> {
        let state = self.state.borrow();
        let all: Vec<BlockDevice> = self.devices.iter().map(|d| self.snapshot(d, &state)).collect();
        match filter {
            None => Ok(all),
            Some(path) => crate::disk::find_in(&all, path)
                .map(|device| vec![device.clone()])
                .ok_or_else(|| {
                    RescueError::query(format!("lsblk: {}: not a block device", path.display()))
                }),
        }
    }
}

impl Mounter for FakeHost {
    fn mount(&self, device: &Path, mountpoint: &Path) -> Result<i32> {
        let mut state = self.state.borrow_mut();
        state
            .mount_calls
            .push((device.to_path_buf(), mountpoint.to_path_buf()));
        if state.fail_mounts {
            return Ok(0);
        }
        state
            .mounts
            .insert(device.to_path_buf(), mountpoint.to_path_buf());
        if let Some(files) = state.contents.get(device) {
            for (rel, bytes) in files {
                let path = mountpoint.join(rel);
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&path, bytes)?;
            }
        }
        Ok(0)
    }

    fn unmount(&self, device: &Path) -> Result<i32> {
        let mut state = self.state.borrow_mut();
        state.unmount_calls.push(device.to_path_buf());
        if state.busy.contains(device) {
            return Ok(32);
        }
        let Some(mountpoint) = state.mounts.remove(device) else {
            return Ok(32);
        };
        if state.contents.contains_key(device) && mountpoint.is_dir() {
            for entry in fs::read_dir(&mountpoint)? {
                let path = entry?.path();
                if path.is_dir() {
                    fs::remove_dir_all(&path)?;
                } else {
                    fs::remove_file(&path)?;
                }
            }
        }
        Ok(0)
    }
}

impl Copier for FakeHost {
    fn copy_tree(&self, source: &Path, dest: &Path) -> Result<i32> {
        if self.state.borrow().fail_copies {
            return Ok(1);
        }
        let Some(name) = source.file_name() else {
            return Ok(1);
        };
        let target = dest.join(name);
        for entry in WalkDir::new(source) {
            let entry = entry.map_err(|e| RescueError::message(e.to_string()))?;
            let rel = entry
                .path()
                .strip_prefix(source)
                .map_err(|e| RescueError::message(e.to_string()))?;
            let out = target.join(rel);
            if entry.file_type().is_dir() {
                fs::create_dir_all(&out)?;
            } else {
                fs::copy(entry.path(), &out)?;
            }
        }
        Ok(0)
    }

    fn sync(&self) -> Result<i32> {
        self.state.borrow_mut().sync_calls += 1;
        Ok(0)
    }
}
