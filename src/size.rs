//! Recursive size accumulation.

use std::path::Path;

use crate::error::{FsError, IoResultExt};
use crate::walk::{AsyncWalkWithInfo, WalkConfig, WalkWithInfo};

/// Get the total size of a path in bytes.
///
/// For a directory this is its own size plus the size of everything a
/// default walk reaches; symlinks contribute the size of the link itself,
/// not the target.
pub fn get_size(path: impl AsRef<Path>) -> Result<u64, FsError> {
    let path = path.as_ref();
    let metadata = std::fs::symlink_metadata(path).with_path(path)?;
    let mut total = metadata.len();
    if metadata.is_dir() {
        let config = WalkConfig::new();
        for entry in WalkWithInfo::new(path, &config)? {
            total += entry?.info.size;
        }
    }
    Ok(total)
}

/// Get the total size of a path in bytes, asynchronously. See
/// [`get_size`].
pub async fn get_size_async(path: impl AsRef<Path>) -> Result<u64, FsError> {
    let path = path.as_ref();
    let metadata = tokio::fs::symlink_metadata(path).await.with_path(path)?;
    let mut total = metadata.len();
    if metadata.is_dir() {
        let config = WalkConfig::new();
        let mut walk = AsyncWalkWithInfo::new(path, &config).await?;
        while let Some(entry) = walk.next_entry().await? {
            total += entry.info.size;
        }
    }
    Ok(total)
}
