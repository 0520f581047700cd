//! Existence checks.
//!
//! Checking and then acting on the same path is a race; prefer performing
//! the operation directly and handling its error. These helpers are for
//! the cases where a boolean answer is genuinely what's wanted.

use std::fs::Metadata;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::FsError;

/// Options for [`exists`] and [`exists_async`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ExistsOptions {
    /// Also require the path to be a directory (symlink directories
    /// included, since the check follows symlinks).
    pub is_directory: bool,
    /// Also require the path to be a file (symlink files included).
    pub is_file: bool,
    /// Also require the path to be readable by the current user.
    pub is_readable: bool,
}

/// Test whether a path exists, with optional kind and readability checks.
///
/// `is_directory` and `is_file` are mutually exclusive; enabling both is a
/// configuration error surfaced before any I/O.
pub fn exists(path: impl AsRef<Path>, options: &ExistsOptions) -> Result<bool, FsError> {
    let path = path.as_ref();
    check_options(options)?;
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(FsError::io(path, e)),
    };
    Ok(evaluate(&metadata, options))
}

/// Test whether a path exists, asynchronously. See [`exists`].
pub async fn exists_async(
    path: impl AsRef<Path>,
    options: &ExistsOptions,
) -> Result<bool, FsError> {
    let path = path.as_ref();
    check_options(options)?;
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(FsError::io(path, e)),
    };
    Ok(evaluate(&metadata, options))
}

fn check_options(options: &ExistsOptions) -> Result<(), FsError> {
    if options.is_directory && options.is_file {
        return Err(FsError::ConflictingOptions);
    }
    Ok(())
}

fn evaluate(metadata: &Metadata, options: &ExistsOptions) -> bool {
    if options.is_directory && !metadata.is_dir() {
        return false;
    }
    if options.is_file && !metadata.is_file() {
        return false;
    }
    if options.is_readable {
        return is_readable(metadata);
    }
    true
}

#[cfg(unix)]
fn is_readable(metadata: &Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;

    let mode = metadata.mode();
    // Owner, group, then other read bits, checked against the process's
    // real ids the way `access(2)` with R_OK would.
    if unsafe { libc::getuid() } == metadata.uid() {
        return mode & 0o400 == 0o400;
    }
    if unsafe { libc::getgid() } == metadata.gid() {
        return mode & 0o040 == 0o040;
    }
    mode & 0o004 == 0o004
}

#[cfg(not(unix))]
fn is_readable(_metadata: &Metadata) -> bool {
    true
}
