use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RescueError {
    #[error("{0}")]
    Message(String),
    #[error("query {0}")]
    Query(String),
    #[error("{0}")]
    Disk(DiskError),
    #[error("could not find '{dir}' directory on target partition (mounted at {mount})")]
    MissingData { dir: String, mount: PathBuf },
    #[error(
        "not enough room on local hard drive to store the backup: need at least {required_gib:.2}GB, only {available_gib:.2}GB available"
    )]
    InsufficientSpace { required_gib: f64, available_gib: f64 },
    #[error("the specified backup directory {0} already exists")]
    DestinationConflict(PathBuf),
    #[error("customer name {0:?} cannot be used as a directory name")]
    InvalidCustomer(String),
    #[error("copy {0}")]
    Copy(String),
    #[error("{0}")]
    Config(ConfigError),
    #[error("{0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("parse config: {0}")]
    Parse(String),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum DiskError {
    #[error("could not find target drive for recovery: {0}")]
    AmbiguousTarget(String),
    #[error("target disk has no partitions")]
    NoPartitions,
    #[error("device {0} is no longer present")]
    Vanished(String),
    #[error("failed to mount the target partition: {0}")]
    MountFailure(String),
    #[error("umount {0}")]
    UmountFailure(String),
}

pub type Result<T> = std::result::Result<T, RescueError>;

impl RescueError {
    pub fn message(msg: impl Into<String>) -> Self {
        RescueError::Message(msg.into())
    }

    pub fn query(msg: impl Into<String>) -> Self {
        RescueError::Query(msg.into())
    }
}

impl From<DiskError> for RescueError {
    fn from(err: DiskError) -> Self {
        RescueError::Disk(err)
    }
}

impl From<ConfigError> for RescueError {
    fn from(err: ConfigError) -> Self {
        RescueError::Config(err)
    }
}
