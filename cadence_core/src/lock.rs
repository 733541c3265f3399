//! Sidecar lock files.
//!
//! Data files are replaced by rename (the deck) or retired by rename (the
//! review log), so locking the data file itself would lock an inode that can
//! vanish from under a waiting process. Every data file is instead guarded by
//! an advisory lock on `<file>.lock`, which is never renamed.

use crate::Result;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Path of the sidecar lock file for a data file
pub fn lock_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}

/// Open (creating if needed) the sidecar lock file for `path`
///
/// The parent directory is created too. The caller takes the shared or
/// exclusive lock it needs.
pub fn open_lock_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(lock_path(path))?;
    Ok(file)
}
