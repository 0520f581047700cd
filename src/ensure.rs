//! Ensure-creation: make a directory, file, hard link, or symlink exist.
//!
//! Each helper is a no-op when the path already exists with the right
//! kind, creates it (parents included) when missing, and refuses with
//! [`FsError::EnsureConflict`] when the path exists as something else.

use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use crate::entity::EntityKind;
use crate::error::{FsError, IoResultExt};
use crate::path_util;

/// Ensure a directory exists, creating it and its parents if needed.
pub fn ensure_dir(path: impl AsRef<Path>) -> Result<(), FsError> {
    let path = path.as_ref();
    match std::fs::symlink_metadata(path) {
        Ok(metadata) => {
            let kind = EntityKind::of_metadata(&metadata);
            if kind.is_directory() {
                Ok(())
            } else {
                Err(FsError::EnsureConflict {
                    path: path.to_path_buf(),
                    expected: EntityKind::Directory,
                    actual: kind,
                })
            }
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "creating directory");
            std::fs::create_dir_all(path).with_path(path)
        }
        Err(e) => Err(FsError::io(path, e)),
    }
}

/// Ensure a directory exists, asynchronously. See [`ensure_dir`].
pub async fn ensure_dir_async(path: impl AsRef<Path>) -> Result<(), FsError> {
    let path = path.as_ref();
    match tokio::fs::symlink_metadata(path).await {
        Ok(metadata) => {
            let kind = EntityKind::of_metadata(&metadata);
            if kind.is_directory() {
                Ok(())
            } else {
                Err(FsError::EnsureConflict {
                    path: path.to_path_buf(),
                    expected: EntityKind::Directory,
                    actual: kind,
                })
            }
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "creating directory");
            tokio::fs::create_dir_all(path).await.with_path(path)
        }
        Err(e) => Err(FsError::io(path, e)),
    }
}

/// Ensure an empty file exists, creating parent directories if needed.
/// An existing file is left untouched.
pub fn ensure_file(path: impl AsRef<Path>) -> Result<(), FsError> {
    let path = path.as_ref();
    match std::fs::symlink_metadata(path) {
        Ok(metadata) => {
            let kind = EntityKind::of_metadata(&metadata);
            if kind.is_file() {
                Ok(())
            } else {
                Err(FsError::EnsureConflict {
                    path: path.to_path_buf(),
                    expected: EntityKind::File,
                    actual: kind,
                })
            }
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            if let Some(parent) = path.parent() {
                ensure_dir(parent)?;
            }
            debug!(path = %path.display(), "creating empty file");
            std::fs::write(path, b"").with_path(path)
        }
        Err(e) => Err(FsError::io(path, e)),
    }
}

/// Ensure an empty file exists, asynchronously. See [`ensure_file`].
pub async fn ensure_file_async(path: impl AsRef<Path>) -> Result<(), FsError> {
    let path = path.as_ref();
    match tokio::fs::symlink_metadata(path).await {
        Ok(metadata) => {
            let kind = EntityKind::of_metadata(&metadata);
            if kind.is_file() {
                Ok(())
            } else {
                Err(FsError::EnsureConflict {
                    path: path.to_path_buf(),
                    expected: EntityKind::File,
                    actual: kind,
                })
            }
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            if let Some(parent) = path.parent() {
                ensure_dir_async(parent).await?;
            }
            debug!(path = %path.display(), "creating empty file");
            tokio::fs::write(path, b"").await.with_path(path)
        }
        Err(e) => Err(FsError::io(path, e)),
    }
}

/// Ensure a hard link to `source` exists at `target`, creating the
/// target's parent directories if needed. Hard links across filesystems
/// or to directories are impossible and surface the OS error.
pub fn ensure_link(source: impl AsRef<Path>, target: impl AsRef<Path>) -> Result<(), FsError> {
    let source = source.as_ref();
    let target = target.as_ref();
    if let Some(parent) = target.parent() {
        ensure_dir(parent)?;
    }
    debug!(source = %source.display(), target = %target.display(), "creating hard link");
    std::fs::hard_link(source, target).with_path(target)
}

/// Ensure a hard link exists, asynchronously. See [`ensure_link`].
pub async fn ensure_link_async(
    source: impl AsRef<Path>,
    target: impl AsRef<Path>,
) -> Result<(), FsError> {
    let source = source.as_ref();
    let target = target.as_ref();
    if let Some(parent) = target.parent() {
        ensure_dir_async(parent).await?;
    }
    debug!(source = %source.display(), target = %target.display(), "creating hard link");
    tokio::fs::hard_link(source, target).await.with_path(target)
}

/// Ensure a symlink to `source` exists at `target`.
///
/// An existing symlink already pointing at the resolved source is left
/// alone; a symlink pointing elsewhere surfaces the creation failure; a
/// non-symlink at the target is an [`FsError::EnsureConflict`].
pub fn ensure_symlink(source: impl AsRef<Path>, target: impl AsRef<Path>) -> Result<(), FsError> {
    let source = source.as_ref();
    let target = target.as_ref();
    let source_absolute = path_util::resolve_absolute(source).with_path(source)?;
    let source_meta = std::fs::symlink_metadata(source).with_path(source)?;

    match std::fs::symlink_metadata(target) {
        Ok(metadata) => {
            let kind = EntityKind::of_metadata(&metadata);
            if !kind.is_symlink() {
                return Err(FsError::EnsureConflict {
                    path: target.to_path_buf(),
                    expected: EntityKind::Symlink,
                    actual: kind,
                });
            }
            if std::fs::read_link(target).with_path(target)? == source_absolute {
                return Ok(());
            }
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(FsError::io(target, e)),
    }

    if let Some(parent) = target.parent() {
        ensure_dir(parent)?;
    }
    debug!(source = %source.display(), target = %target.display(), "creating symlink");
    create_symlink(source, target, source_meta.is_dir())
}

/// Ensure a symlink exists, asynchronously. See [`ensure_symlink`].
pub async fn ensure_symlink_async(
    source: impl AsRef<Path>,
    target: impl AsRef<Path>,
) -> Result<(), FsError> {
    let source = source.as_ref();
    let target = target.as_ref();
    let source_absolute = path_util::resolve_absolute(source).with_path(source)?;
    let source_meta = tokio::fs::symlink_metadata(source).await.with_path(source)?;

    match tokio::fs::symlink_metadata(target).await {
        Ok(metadata) => {
            let kind = EntityKind::of_metadata(&metadata);
            if !kind.is_symlink() {
                return Err(FsError::EnsureConflict {
                    path: target.to_path_buf(),
                    expected: EntityKind::Symlink,
                    actual: kind,
                });
            }
            if tokio::fs::read_link(target).await.with_path(target)? == source_absolute {
                return Ok(());
            }
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(FsError::io(target, e)),
    }

    if let Some(parent) = target.parent() {
        ensure_dir_async(parent).await?;
    }
    debug!(source = %source.display(), target = %target.display(), "creating symlink");
    create_symlink_async(source, target, source_meta.is_dir()).await
}

#[cfg(unix)]
fn create_symlink(source: &Path, target: &Path, _source_is_dir: bool) -> Result<(), FsError> {
    std::os::unix::fs::symlink(source, target).with_path(target)
}

#[cfg(windows)]
fn create_symlink(source: &Path, target: &Path, source_is_dir: bool) -> Result<(), FsError> {
    if source_is_dir {
        std::os::windows::fs::symlink_dir(source, target).with_path(target)
    } else {
        std::os::windows::fs::symlink_file(source, target).with_path(target)
    }
}

#[cfg(unix)]
async fn create_symlink_async(
    source: &Path,
    target: &Path,
    _source_is_dir: bool,
) -> Result<(), FsError> {
    tokio::fs::symlink(source, target).await.with_path(target)
}

#[cfg(windows)]
async fn create_symlink_async(
    source: &Path,
    target: &Path,
    source_is_dir: bool,
) -> Result<(), FsError> {
    if source_is_dir {
        tokio::fs::symlink_dir(source, target).await.with_path(target)
    } else {
        tokio::fs::symlink_file(source, target).await.with_path(target)
    }
}
