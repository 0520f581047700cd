//! Byte, symlink, and directory comparison.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::error::{FsError, IoResultExt};
use crate::walk::{AsyncWalkWithInfo, WalkConfig, WalkEntryExtra, WalkWithInfo};

const CHUNK_SIZE: usize = 64 * 1024;

/// Result of [`compare_directories`]: relative paths present only in the
/// new tree, present in both but different, and present only in the old
/// tree. Each list is sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirDiff {
    pub created: Vec<PathBuf>,
    pub modified: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
}

impl DirDiff {
    /// Whether the two trees were identical.
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }
}

/// Compare two files for byte equality, returning true when they differ.
pub fn compare_files_differ(
    path_a: impl AsRef<Path>,
    path_b: impl AsRef<Path>,
) -> Result<bool, FsError> {
    let path_a = path_a.as_ref();
    let path_b = path_b.as_ref();
    let mut file_a = std::fs::File::open(path_a).with_path(path_a)?;
    let mut file_b = std::fs::File::open(path_b).with_path(path_b)?;
    let mut buffer_a = vec![0u8; CHUNK_SIZE];
    let mut buffer_b = vec![0u8; CHUNK_SIZE];

    loop {
        let read_a = read_full(&mut file_a, &mut buffer_a).with_path(path_a)?;
        let read_b = read_full(&mut file_b, &mut buffer_b).with_path(path_b)?;
        if read_a != read_b || buffer_a[..read_a] != buffer_b[..read_b] {
            return Ok(true);
        }
        if read_a == 0 {
            return Ok(false);
        }
    }
}

/// Compare two files for byte equality, asynchronously. See
/// [`compare_files_differ`].
pub async fn compare_files_differ_async(
    path_a: impl AsRef<Path>,
    path_b: impl AsRef<Path>,
) -> Result<bool, FsError> {
    let path_a = path_a.as_ref();
    let path_b = path_b.as_ref();
    let mut file_a = tokio::fs::File::open(path_a).await.with_path(path_a)?;
    let mut file_b = tokio::fs::File::open(path_b).await.with_path(path_b)?;
    let mut buffer_a = vec![0u8; CHUNK_SIZE];
    let mut buffer_b = vec![0u8; CHUNK_SIZE];

    loop {
        let read_a = read_full_async(&mut file_a, &mut buffer_a)
            .await
            .with_path(path_a)?;
        let read_b = read_full_async(&mut file_b, &mut buffer_b)
            .await
            .with_path(path_b)?;
        if read_a != read_b || buffer_a[..read_a] != buffer_b[..read_b] {
            return Ok(true);
        }
        if read_a == 0 {
            return Ok(false);
        }
    }
}

/// Compare two symlinks' targets, returning true when they differ.
pub fn compare_symlinks_differ(
    path_a: impl AsRef<Path>,
    path_b: impl AsRef<Path>,
) -> Result<bool, FsError> {
    let path_a = path_a.as_ref();
    let path_b = path_b.as_ref();
    let target_a = std::fs::read_link(path_a).with_path(path_a)?;
    let target_b = std::fs::read_link(path_b).with_path(path_b)?;
    Ok(target_a != target_b)
}

/// Compare two symlinks' targets, asynchronously.
pub async fn compare_symlinks_differ_async(
    path_a: impl AsRef<Path>,
    path_b: impl AsRef<Path>,
) -> Result<bool, FsError> {
    let path_a = path_a.as_ref();
    let path_b = path_b.as_ref();
    let target_a = tokio::fs::read_link(path_a).await.with_path(path_a)?;
    let target_b = tokio::fs::read_link(path_b).await.with_path(path_b)?;
    Ok(target_a != target_b)
}

/// Compare the differences between two directories.
///
/// Both roots are walked independently with extended info and indexed by
/// relative path. A path in both trees counts as modified when the kinds
/// differ, when same-kind files differ by bytes, or when same-kind
/// symlinks differ by target; two directories never do.
pub fn compare_directories(
    old_path: impl AsRef<Path>,
    new_path: impl AsRef<Path>,
) -> Result<DirDiff, FsError> {
    let old_path = old_path.as_ref();
    let new_path = new_path.as_ref();
    require_directory(old_path)?;
    require_directory(new_path)?;
    debug!(old = %old_path.display(), new = %new_path.display(), "diffing directories");

    let config = WalkConfig::new();
    let old_entries = index_walk(WalkWithInfo::new(old_path, &config)?)?;
    let new_entries = index_walk(WalkWithInfo::new(new_path, &config)?)?;

    let mut diff = DirDiff::default();
    for (relative, old_entry) in &old_entries {
        match new_entries.get(relative) {
            None => diff.removed.push(relative.clone().into()),
            Some(new_entry) => {
                if entries_differ(old_entry, new_entry)? {
                    diff.modified.push(relative.clone().into());
                }
            }
        }
    }
    for relative in new_entries.keys() {
        if !old_entries.contains_key(relative) {
            diff.created.push(relative.clone().into());
        }
    }
    Ok(diff)
}

/// Compare the differences between two directories, asynchronously. See
/// [`compare_directories`].
pub async fn compare_directories_async(
    old_path: impl AsRef<Path>,
    new_path: impl AsRef<Path>,
) -> Result<DirDiff, FsError> {
    let old_path = old_path.as_ref();
    let new_path = new_path.as_ref();
    require_directory_async(old_path).await?;
    require_directory_async(new_path).await?;
    debug!(old = %old_path.display(), new = %new_path.display(), "diffing directories");

    let config = WalkConfig::new();
    let old_entries =
        index_entries(AsyncWalkWithInfo::new(old_path, &config).await?.collect_entries().await?);
    let new_entries =
        index_entries(AsyncWalkWithInfo::new(new_path, &config).await?.collect_entries().await?);

    let mut diff = DirDiff::default();
    for (relative, old_entry) in &old_entries {
        match new_entries.get(relative) {
            None => diff.removed.push(relative.clone().into()),
            Some(new_entry) => {
                if entries_differ_async(old_entry, new_entry).await? {
                    diff.modified.push(relative.clone().into());
                }
            }
        }
    }
    for relative in new_entries.keys() {
        if !old_entries.contains_key(relative) {
            diff.created.push(relative.clone().into());
        }
    }
    Ok(diff)
}

fn entries_differ(old: &WalkEntryExtra, new: &WalkEntryExtra) -> Result<bool, FsError> {
    if old.entry.kind != new.entry.kind {
        return Ok(true);
    }
    if old.entry.is_directory() {
        return Ok(false);
    }
    if old.entry.is_file() {
        return compare_files_differ(&old.entry.path_absolute, &new.entry.path_absolute);
    }
    // Both are symlinks of the same flavor.
    compare_symlinks_differ(&old.entry.path_absolute, &new.entry.path_absolute)
}

async fn entries_differ_async(
    old: &WalkEntryExtra,
    new: &WalkEntryExtra,
) -> Result<bool, FsError> {
    if old.entry.kind != new.entry.kind {
        return Ok(true);
    }
    if old.entry.is_directory() {
        return Ok(false);
    }
    if old.entry.is_file() {
        return compare_files_differ_async(&old.entry.path_absolute, &new.entry.path_absolute)
            .await;
    }
    compare_symlinks_differ_async(&old.entry.path_absolute, &new.entry.path_absolute).await
}

fn index_walk(walk: WalkWithInfo<'_>) -> Result<BTreeMap<String, WalkEntryExtra>, FsError> {
    let mut index = BTreeMap::new();
    for entry in walk {
        let entry = entry?;
        index.insert(entry.entry.path_relative.to_string_lossy().into_owned(), entry);
    }
    Ok(index)
}

fn index_entries(entries: Vec<WalkEntryExtra>) -> BTreeMap<String, WalkEntryExtra> {
    entries
        .into_iter()
        .map(|entry| {
            (
                entry.entry.path_relative.to_string_lossy().into_owned(),
                entry,
            )
        })
        .collect()
}

fn require_directory(path: &Path) -> Result<(), FsError> {
    let metadata = std::fs::symlink_metadata(path).with_path(path)?;
    if metadata.is_dir() {
        Ok(())
    } else {
        Err(FsError::NotADirectory(path.to_path_buf()))
    }
}

async fn require_directory_async(path: &Path) -> Result<(), FsError> {
    let metadata = tokio::fs::symlink_metadata(path).await.with_path(path)?;
    if metadata.is_dir() {
        Ok(())
    } else {
        Err(FsError::NotADirectory(path.to_path_buf()))
    }
}

/// Read until the buffer is full or the stream ends, so equal files read
/// through differently-sized intermediate reads still compare equal.
fn read_full(reader: &mut impl Read, buffer: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        let read = reader.read(&mut buffer[filled..])?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    Ok(filled)
}

async fn read_full_async(
    reader: &mut tokio::fs::File,
    buffer: &mut [u8],
) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        let read = reader.read(&mut buffer[filled..]).await?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    Ok(filled)
}
