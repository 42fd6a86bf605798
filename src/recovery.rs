//! The recovery pipeline.
//!
//! Stages run strictly in order and each one either hands over to the next
//! or aborts the session. The selected partition is held by a
//! [`MountGuard`] from the moment it is mounted, so every abort after that
//! point unmounts it before the error reaches the caller.

use std::fmt;
use std::io::BufRead;
use std::path::PathBuf;
use std::thread;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, warn};

use crate::backup::copy::Copier;
use crate::backup::{destination_path, prepare_destination, run_copy};
use crate::config::model::RuntimeConfig;
use crate::console;
use crate::disk::lsblk::Inspector;
use crate::disk::target::{find_target_disk, list_target_partitions, select_largest_partition};
use crate::error::{Result, RescueError};
use crate::mount::guard::MountGuard;
use crate::mount::ops::Mounter;
use crate::mount::{mount, unmount_all};
use crate::preflight::{check_sufficient_space, measure_directory_size, to_gib, verify_data_directory};
use crate::types::CustomerId;

const CUSTOMER_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Init,
    ResolveDisk,
    ResolvePartition,
    UnmountAll,
    Mount,
    ValidateData,
    ValidateSpace,
    PromptCustomer,
    PrepareDestination,
    Copy,
    Sync,
    Unmount,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::ResolveDisk => "resolve-disk",
            Stage::ResolvePartition => "resolve-partition",
            Stage::UnmountAll => "unmount-all",
            Stage::Mount => "mount",
            Stage::ValidateData => "validate-data",
            Stage::ValidateSpace => "validate-space",
            Stage::PromptCustomer => "prompt-customer",
            Stage::PrepareDestination => "prepare-destination",
            Stage::Copy => "copy",
            Stage::Sync => "sync",
            Stage::Unmount => "unmount",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State accumulated by the pipeline, one field per completed stage.
#[derive(Debug, Clone, Default)]
pub struct RecoverySession {
    pub stage: Stage,
    pub source_available: u64,
    pub target_disk: Option<PathBuf>,
    pub candidates: Vec<PathBuf>,
    pub target: Option<PathBuf>,
    pub mount_path: PathBuf,
    pub target_size: u64,
    pub customer: Option<CustomerId>,
    pub destination: Option<PathBuf>,
}

#[derive(Debug, Error)]
#[error("{error}")]
pub struct Abort {
    pub stage: Stage,
    pub error: RescueError,
}

pub struct Recovery<'a> {
    config: &'a RuntimeConfig,
    inspector: &'a dyn Inspector,
    mounter: &'a dyn Mounter,
    copier: &'a dyn Copier,
    today: NaiveDate,
}

impl<'a> Recovery<'a> {
    pub fn new(
        config: &'a RuntimeConfig,
        inspector: &'a dyn Inspector,
        mounter: &'a dyn Mounter,
        copier: &'a dyn Copier,
        today: NaiveDate,
    ) -> Self {
        Self {
            config,
            inspector,
            mounter,
            copier,
            today,
        }
    }

    pub fn run(&self, input: &mut dyn BufRead) -> std::result::Result<RecoverySession, Abort> {
        let mut session = RecoverySession {
            mount_path: self.config.scratch_mount.clone(),
            ..RecoverySession::default()
        };
        match self.run_stages(&mut session, input) {
            Ok(()) => {
                enter(&mut session, Stage::Done);
                Ok(session)
            }
            Err(error) => {
                warn!(stage = %session.stage, error = %error, "recovery aborted");
                Err(Abort {
                    stage: session.stage,
                    error,
                })
            }
        }
    }

    fn run_stages(&self, session: &mut RecoverySession, input: &mut dyn BufRead) -> Result<()> {
        enter(session, Stage::Init);
        let root = self.inspector.query_root_source()?;
        session.source_available = self.inspector.query_available_space(&root)?;
        info!(root = %root.display(), available = session.source_available, "local drive");

        enter(session, Stage::ResolveDisk);
        let disk = find_target_disk(self.inspector)?;
        console::progress(format!("Found customer drive {}", disk.display()));
        session.target_disk = Some(disk.clone());

        enter(session, Stage::ResolvePartition);
        session.candidates = list_target_partitions(self.inspector, &disk)?;
        let target = select_largest_partition(self.inspector, &session.candidates)?;
        console::progress(format!("Selected largest partition {}", target.display()));
        session.target = Some(target.clone());

        enter(session, Stage::UnmountAll);
        if let Err(err) = unmount_all(self.inspector, self.mounter, &session.candidates) {
            console::failure(err);
        }

        enter(session, Stage::Mount);
        let guard = mount(self.inspector, self.mounter, &target, &self.config.scratch_mount)?;
        console::progress(format!(
            "Mounted {} at {}",
            guard.device().display(),
            guard.mountpoint().display()
        ));

        enter(session, Stage::ValidateData);
        let data = verify_data_directory(guard.mountpoint(), &self.config.data_dir)?;
        session.target_size = measure_directory_size(&data)?;

        enter(session, Stage::ValidateSpace);
        check_sufficient_space(session.source_available, session.target_size)?;
        console::progress(format!(
            "{} holds {:.2}GB; local drive has {:.2}GB available",
            data.display(),
            to_gib(session.target_size),
            to_gib(session.source_available)
        ));

        enter(session, Stage::PromptCustomer);
        let customer = prompt_customer(input)?;
        session.customer = Some(customer.clone());

        enter(session, Stage::PrepareDestination);
        let dest = prepare_destination(&self.config.backup_root, &customer, self.today)?
            .ok_or_else(|| {
                RescueError::DestinationConflict(destination_path(
                    &self.config.backup_root,
                    &customer,
                    self.today,
                ))
            })?;
        session.destination = Some(dest.clone());

        enter(session, Stage::Copy);
        console::progress(format!(
            "Running recovery in {} seconds...",
            self.config.settle_delay.as_secs()
        ));
        thread::sleep(self.config.settle_delay);
        let copied = run_copy(self.copier, &data, &dest);

        enter(session, Stage::Sync);
        println!();
        console::progress("Synchronizing data.");
        console::progress("Do not remove the drive yet...");
        let rc = self.copier.sync()?;
        if rc != 0 {
            warn!(rc, "sync exited non-zero");
        }
        thread::sleep(self.config.sync_delay);

        enter(session, Stage::Unmount);
        let released = release(guard);
        if let Err(err) = copied {
            session.stage = Stage::Copy;
            if let Err(unmount_err) = released {
                console::failure(unmount_err);
            }
            return Err(err);
        }
        released
    }
}

fn enter(session: &mut RecoverySession, stage: Stage) {
    session.stage = stage;
    info!(stage = %stage, "stage");
}

fn release(guard: MountGuard<'_>) -> Result<()> {
    let device = guard.device().to_path_buf();
    guard.release()?;
    console::progress(format!("Unmounted {}", device.display()));
    Ok(())
}

/// Reads the customer name, asking again for names that cannot be used as
/// a directory.
pub fn prompt_customer(input: &mut dyn BufRead) -> Result<CustomerId> {
    let mut last = String::new();
    for _ in 0..CUSTOMER_ATTEMPTS {
        console::prompt("Enter the customer's name: ");
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            println!();
            return Err(RescueError::InvalidCustomer("<end of input>".to_string()));
        }
        match line.parse::<CustomerId>() {
            Ok(customer) => return Ok(customer),
            Err(reason) => {
                console::failure(reason);
                last = line.trim_end().to_string();
            }
        }
    }
    Err(RescueError::InvalidCustomer(last))
}
