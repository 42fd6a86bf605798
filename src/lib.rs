pub mod backup;
pub mod cli;
pub mod config;
pub mod console;
pub mod disk;
pub mod error;
pub mod mount;
pub mod preflight;
pub mod recovery;
pub mod types;
pub mod util;

#[cfg(test)]
mod testing;

pub use error::{Result, RescueError};
pub use recovery::{Recovery, RecoverySession, Stage};
