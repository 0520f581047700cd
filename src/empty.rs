//! Directory emptying.

use std::path::Path;

use tracing::debug;

use crate::ensure::{ensure_dir, ensure_dir_async};
use crate::error::{FsError, IoResultExt};

/// Ensure a directory exists and has no contents.
///
/// A missing directory is created; an existing one has every child
/// removed while the directory itself is kept. Removal failures do not
/// stop the sweep: every child is attempted and the failures are reported
/// together in [`FsError::EmptyDirFailed`].
pub fn empty_dir(path: impl AsRef<Path>) -> Result<(), FsError> {
    let path = path.as_ref();
    ensure_dir(path)?;
    debug!(path = %path.display(), "emptying directory");

    let mut failures = Vec::new();
    for dirent in std::fs::read_dir(path).with_path(path)? {
        let dirent = match dirent {
            Ok(dirent) => dirent,
            Err(e) => {
                failures.push((path.to_path_buf(), e));
                continue;
            }
        };
        let child = dirent.path();
        let result = match dirent.file_type() {
            Ok(file_type) if file_type.is_dir() => std::fs::remove_dir_all(&child),
            Ok(_) => std::fs::remove_file(&child),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            failures.push((child, e));
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(FsError::EmptyDirFailed {
            path: path.to_path_buf(),
            failures,
        })
    }
}

/// Ensure a directory exists and has no contents, asynchronously.
/// See [`empty_dir`].
pub async fn empty_dir_async(path: impl AsRef<Path>) -> Result<(), FsError> {
    let path = path.as_ref();
    ensure_dir_async(path).await?;
    debug!(path = %path.display(), "emptying directory");

    let mut failures = Vec::new();
    let mut read_dir = tokio::fs::read_dir(path).await.with_path(path)?;
    loop {
        let dirent = match read_dir.next_entry().await {
            Ok(Some(dirent)) => dirent,
            Ok(None) => break,
            Err(e) => {
                failures.push((path.to_path_buf(), e));
                break;
            }
        };
        let child = dirent.path();
        let result = match dirent.file_type().await {
            Ok(file_type) if file_type.is_dir() => tokio::fs::remove_dir_all(&child).await,
            Ok(_) => tokio::fs::remove_file(&child).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            failures.push((child, e));
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(FsError::EmptyDirFailed {
            path: path.to_path_buf(),
            failures,
        })
    }
}
