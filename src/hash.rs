//! Recursive content hashing.
//!
//! A path hashes to a SHA-256 hex digest: files by content, symlinks by
//! their target path, directories by folding the digests of everything a
//! default walk reaches, keyed and sorted by relative path. Because the
//! keys are relative, two identical trees hash the same wherever they
//! live.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::entity::EntityKind;
use crate::error::{FsError, IoResultExt};
use crate::walk::{AsyncWalk, Walk, WalkConfig, WalkEntry};

/// Sentinel digest a directory contributes to its parent's fold.
const DIR_SENTINEL: &str =
    "----------------------------------------------------------------";

/// Get the hash of a path.
///
/// The path may be a directory, file, or symlink; anything else fails
/// with [`FsError::UnknownEntityType`].
pub fn get_hash(path: impl AsRef<Path>) -> Result<String, FsError> {
    let path = path.as_ref();
    let metadata = std::fs::symlink_metadata(path).with_path(path)?;
    match EntityKind::of_metadata(&metadata) {
        EntityKind::Directory => directory_hash(path),
        EntityKind::File => file_hash(path),
        EntityKind::Symlink => symlink_hash(path),
        EntityKind::Unknown => Err(FsError::UnknownEntityType(path.to_path_buf())),
    }
}

/// Get the hash of a path, asynchronously. See [`get_hash`].
pub async fn get_hash_async(path: impl AsRef<Path>) -> Result<String, FsError> {
    let path = path.as_ref();
    let metadata = tokio::fs::symlink_metadata(path).await.with_path(path)?;
    match EntityKind::of_metadata(&metadata) {
        EntityKind::Directory => directory_hash_async(path).await,
        EntityKind::File => file_hash_async(path).await,
        EntityKind::Symlink => symlink_hash_async(path).await,
        EntityKind::Unknown => Err(FsError::UnknownEntityType(path.to_path_buf())),
    }
}

fn file_hash(path: &Path) -> Result<String, FsError> {
    let mut file = std::fs::File::open(path).with_path(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).with_path(path)?;
    Ok(hex(&hasher.finalize()))
}

async fn file_hash_async(path: &Path) -> Result<String, FsError> {
    let mut file = tokio::fs::File::open(path).await.with_path(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 64 * 1024];
    loop {
        let read = file.read(&mut buffer).await.with_path(path)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex(&hasher.finalize()))
}

fn symlink_hash(path: &Path) -> Result<String, FsError> {
    let target = std::fs::read_link(path).with_path(path)?;
    Ok(hex(&Sha256::digest(target.to_string_lossy().as_bytes())))
}

async fn symlink_hash_async(path: &Path) -> Result<String, FsError> {
    let target = tokio::fs::read_link(path).await.with_path(path)?;
    Ok(hex(&Sha256::digest(target.to_string_lossy().as_bytes())))
}

fn entry_digest_slot(
    bin: &mut BTreeMap<String, String>,
    entry: &WalkEntry,
    digest: String,
) -> Result<(), FsError> {
    let key = entry.path_relative.to_string_lossy().into_owned();
    if bin.insert(key, digest).is_some() {
        return Err(FsError::DuplicateEntry(entry.path_relative.clone()));
    }
    Ok(())
}

fn fold(bin: BTreeMap<String, String>) -> String {
    let raw = bin
        .into_iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("\n");
    hex(&Sha256::digest(raw.as_bytes()))
}

fn directory_hash(path: &Path) -> Result<String, FsError> {
    debug!(path = %path.display(), "hashing directory");
    let config = WalkConfig::new();
    let mut bin = BTreeMap::new();
    for entry in Walk::new(path, &config)? {
        let entry = entry?;
        let digest = if entry.is_directory() {
            DIR_SENTINEL.to_string()
        } else if entry.is_file() {
            file_hash(&entry.path_absolute)?
        } else {
            symlink_hash(&entry.path_absolute)?
        };
        entry_digest_slot(&mut bin, &entry, digest)?;
    }
    Ok(fold(bin))
}

async fn directory_hash_async(path: &Path) -> Result<String, FsError> {
    debug!(path = %path.display(), "hashing directory");
    let config = WalkConfig::new();
    let mut walk = AsyncWalk::new(path, &config).await?;
    let mut bin = BTreeMap::new();
    while let Some(entry) = walk.next_entry().await? {
        let digest = if entry.is_directory() {
            DIR_SENTINEL.to_string()
        } else if entry.is_file() {
            file_hash_async(&entry.path_absolute).await?
        } else {
            symlink_hash_async(&entry.path_absolute).await?
        };
        entry_digest_slot(&mut bin, &entry, digest)?;
    }
    Ok(fold(bin))
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sample_tree(dir: &Path) {
        fs::write(dir.join("a.txt"), "0123456789").unwrap();
        fs::create_dir(dir.join("b")).unwrap();
        fs::write(dir.join("b/c.txt"), "01234").unwrap();
    }

    #[test]
    fn test_file_hash_depends_on_content_only() {
        let dir = TempDir::new().unwrap();
        let one = dir.path().join("one.txt");
        let two = dir.path().join("two.txt");
        fs::write(&one, "same bytes").unwrap();
        fs::write(&two, "same bytes").unwrap();

        assert_eq!(get_hash(&one).unwrap(), get_hash(&two).unwrap());

        fs::write(&two, "other bytes").unwrap();
        assert_ne!(get_hash(&one).unwrap(), get_hash(&two).unwrap());
    }

    #[test]
    fn test_directory_hash_is_location_independent() {
        let left = TempDir::new().unwrap();
        let right = TempDir::new().unwrap();
        sample_tree(left.path());
        sample_tree(right.path());

        assert_eq!(
            get_hash(left.path()).unwrap(),
            get_hash(right.path()).unwrap()
        );
    }

    #[test]
    fn test_directory_hash_sees_nested_change() {
        let dir = TempDir::new().unwrap();
        sample_tree(dir.path());
        let before = get_hash(dir.path()).unwrap();

        fs::write(dir.path().join("b/c.txt"), "01235").unwrap();
        let after = get_hash(dir.path()).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn test_empty_directory_hash_is_stable() {
        let left = TempDir::new().unwrap();
        let right = TempDir::new().unwrap();
        assert_eq!(
            get_hash(left.path()).unwrap(),
            get_hash(right.path()).unwrap()
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_hash_uses_target_path() {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("data"), "x").unwrap();
        let one = dir.path().join("l1");
        let two = dir.path().join("l2");
        symlink(dir.path().join("data"), &one).unwrap();
        symlink(dir.path().join("data"), &two).unwrap();

        assert_eq!(get_hash(&one).unwrap(), get_hash(&two).unwrap());

        let other = dir.path().join("l3");
        symlink(dir.path().join("elsewhere"), &other).unwrap();
        assert_ne!(get_hash(&one).unwrap(), get_hash(&other).unwrap());
    }

    #[tokio::test]
    async fn test_async_hash_matches_sync() {
        let dir = TempDir::new().unwrap();
        sample_tree(dir.path());

        assert_eq!(
            get_hash(dir.path()).unwrap(),
            get_hash_async(dir.path()).await.unwrap()
        );
        let file = dir.path().join("a.txt");
        assert_eq!(
            get_hash(&file).unwrap(),
            get_hash_async(&file).await.unwrap()
        );
    }
}
