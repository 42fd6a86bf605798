use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::backup::copy::Copier;
use crate::error::{Result, RescueError};
use crate::types::CustomerId;
use crate::util::paths::{create_dir_verified, is_real_dir};

pub mod copy;

pub fn destination_path(backup_root: &Path, customer: &CustomerId, today: NaiveDate) -> PathBuf {
    backup_root
        .join(customer.as_str())
        .join(today.format("%Y-%m-%d").to_string())
}

/// Creates `<root>/<customer>/<date>`. Returns `None` when it already exists;
/// an existing backup is never reused or touched.
pub fn prepare_destination(
    backup_root: &Path,
    customer: &CustomerId,
    today: NaiveDate,
) -> Result<Option<PathBuf>> {
    let dest = destination_path(backup_root, customer, today);
    if dest.exists() {
        warn!(dest = %dest.display(), "backup directory already exists");
        return Ok(None);
    }
    create_dir_verified(&dest)?;
    info!(dest = %dest.display(), "backup directory created");
    Ok(Some(dest))
}

/// Copies `source` into `dest` and confirms `dest/<source name>` exists.
pub fn run_copy(copier: &dyn Copier, source: &Path, dest: &Path) -> Result<PathBuf> {
    let name = source
        .file_name()
        .ok_or_else(|| RescueError::Copy(format!("{} has no directory name", source.display())))?;
    let copied = dest.join(name);
    let rc = copier.copy_tree(source, dest)?;
    if rc != 0 {
        return Err(RescueError::Copy(format!(
            "{} -> {} failed with exit code {}",
            source.display(),
            dest.display(),
            rc
        )));
    }
    if !is_real_dir(&copied) {
        return Err(RescueError::Copy(format!(
            "{} missing after copy",
            copied.display()
        )));
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHost;
    use std::fs;
    use tempfile::TempDir;

    fn customer(name: &str) -> CustomerId {
        name.parse().expect("customer")
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).expect("date")
    }

    #[test]
    fn destination_layout() {
        let dest = destination_path(Path::new("/root/Customer_Backups"), &customer("Jane Doe"), day());
        assert_eq!(dest, PathBuf::from("/root/Customer_Backups/Jane_Doe/2026-10-19"));
    }

    #[test]
    fn second_prepare_on_same_day_conflicts() {
        let root = TempDir::new().expect("tempdir");
        let first = prepare_destination(root.path(), &customer("Jane"), day())
            .expect("prepare")
            .expect("new destination");
        assert!(first.is_dir());
        fs::write(first.join("marker"), b"keep").expect("write");

        let second = prepare_destination(root.path(), &customer("Jane"), day()).expect("prepare");
        assert!(second.is_none());
        assert_eq!(fs::read(first.join("marker")).expect("read"), b"keep");

        let next_day = day().succ_opt().expect("next day");
        assert!(prepare_destination(root.path(), &customer("Jane"), next_day)
            .expect("prepare")
            .is_some());
    }

    #[test]
    fn copy_is_verified_by_result_directory() {
        let src = TempDir::new().expect("tempdir");
        let dest = TempDir::new().expect("tempdir");
        let users = src.path().join("Users");
        fs::create_dir_all(users.join("jane/Documents")).expect("mkdir");
        fs::write(users.join("jane/Documents/a.txt"), b"hello").expect("write");

        let host = FakeHost::new(Vec::new());
        let copied = run_copy(&host, &users, dest.path()).expect("copy");
        assert_eq!(copied, dest.path().join("Users"));
        assert_eq!(
            fs::read(copied.join("jane/Documents/a.txt")).expect("read"),
            b"hello"
        );
    }

    /// Leaves a symlink where the copied tree should be.
    struct LinkCopier(PathBuf);

    impl Copier for LinkCopier {
        fn copy_tree(&self, source: &Path, dest: &Path) -> Result<i32> {
            let name = source.file_name().expect("source name");
            std::os::unix::fs::symlink(&self.0, dest.join(name))?;
            Ok(0)
        }

        fn sync(&self) -> Result<i32> {
            Ok(0)
        }
    }

    #[test]
    fn copied_symlink_is_not_a_backup() {
        let src = TempDir::new().expect("tempdir");
        let dest = TempDir::new().expect("tempdir");
        let elsewhere = TempDir::new().expect("tempdir");
        let users = src.path().join("Users");
        fs::create_dir_all(&users).expect("mkdir");

        let copier = LinkCopier(elsewhere.path().to_path_buf());
        let err = run_copy(&copier, &users, dest.path()).unwrap_err();
        assert!(matches!(err, RescueError::Copy(_)));
    }

    #[test]
    fn copy_exit_code_is_surfaced() {
        let src = TempDir::new().expect("tempdir");
        let dest = TempDir::new().expect("tempdir");
        let users = src.path().join("Users");
        fs::create_dir_all(&users).expect("mkdir");

        let host = FakeHost::new(Vec::new());
        host.fail_copies();
        let err = run_copy(&host, &users, dest.path()).unwrap_err();
        assert!(matches!(err, RescueError::Copy(_)));
    }
}
