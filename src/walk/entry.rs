//! Walk entry types.

use std::fs::Metadata;
use std::path::PathBuf;
use std::time::SystemTime;

use serde::Serialize;

/// The kind of a walked entry. Exactly one kind applies to every entry a
/// walk yields; an entity that fits none of these fails the walk instead
/// of being produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkEntryKind {
    Directory,
    File,
    SymlinkDirectory,
    SymlinkFile,
}

/// One filesystem object encountered during a walk.
///
/// Entries are snapshots: they are produced on demand, never mutated, and
/// hold no handle to the filesystem object they describe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalkEntry {
    /// Leaf name of the entry, without any path.
    pub name: String,
    /// Absolute path as reached, through any symlink on the way.
    pub path_absolute: PathBuf,
    /// Canonical absolute path, with every symlink resolved.
    pub path_absolute_real: PathBuf,
    /// Path relative to the walk root, as reached.
    pub path_relative: PathBuf,
    /// Canonical path expressed relative to the walk root. May climb out
    /// of the root when the canonical location lies elsewhere.
    pub path_relative_real: PathBuf,
    /// The entry's kind.
    pub kind: WalkEntryKind,
    /// Whether any ancestor directory on the way here was entered through
    /// a symlink.
    pub via_symlink_directory: bool,
}

impl WalkEntry {
    /// Whether the entry is a real directory.
    pub fn is_directory(&self) -> bool {
        self.kind == WalkEntryKind::Directory
    }

    /// Whether the entry is a real file.
    pub fn is_file(&self) -> bool {
        self.kind == WalkEntryKind::File
    }

    /// Whether the entry is a symlink whose target is a directory.
    pub fn is_symlink_directory(&self) -> bool {
        self.kind == WalkEntryKind::SymlinkDirectory
    }

    /// Whether the entry is a symlink whose target is a file.
    pub fn is_symlink_file(&self) -> bool {
        self.kind == WalkEntryKind::SymlinkFile
    }

    /// Whether the entry is file-like (a file or a symlink to one).
    pub fn is_file_like(&self) -> bool {
        self.is_file() || self.is_symlink_file()
    }
}

/// Extended status for an entry, from one extra `lstat` call.
///
/// Fields the platform does not report are `None`; on non-Unix hosts that
/// covers ownership, mode, and the device/inode family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryInfo {
    /// Size in bytes. For symlinks, the size of the link itself.
    pub size: u64,
    /// Last access time.
    pub atime: Option<SystemTime>,
    /// Last modification time.
    pub mtime: Option<SystemTime>,
    /// Last status-change time.
    pub ctime: Option<SystemTime>,
    /// Creation time.
    pub birthtime: Option<SystemTime>,
    /// Owning user id.
    pub uid: Option<u32>,
    /// Owning group id.
    pub gid: Option<u32>,
    /// Permission bits and file type, as reported by the platform.
    pub mode: Option<u32>,
    /// Device id of the containing filesystem.
    pub dev: Option<u64>,
    /// Inode number.
    pub ino: Option<u64>,
    /// Number of hard links.
    pub nlink: Option<u64>,
    /// Device id, for device special files.
    pub rdev: Option<u64>,
    /// Preferred block size for I/O.
    pub blksize: Option<u64>,
    /// Number of allocated blocks.
    pub blocks: Option<u64>,
    /// Whether the entity is a block device.
    pub is_block_device: bool,
    /// Whether the entity is a character device.
    pub is_char_device: bool,
    /// Whether the entity is a FIFO.
    pub is_fifo: bool,
    /// Whether the entity is a socket.
    pub is_socket: bool,
}

impl EntryInfo {
    /// Build from a status record obtained with `lstat` semantics.
    pub fn from_metadata(metadata: &Metadata) -> Self {
        #[cfg(unix)]
        {
            use std::os::unix::fs::{FileTypeExt, MetadataExt};

            let ctime = if metadata.ctime() >= 0 {
                SystemTime::UNIX_EPOCH.checked_add(std::time::Duration::new(
                    metadata.ctime() as u64,
                    metadata.ctime_nsec() as u32,
                ))
            } else {
                None
            };
            let file_type = metadata.file_type();
            Self {
                size: metadata.len(),
                atime: metadata.accessed().ok(),
                mtime: metadata.modified().ok(),
                ctime,
                birthtime: metadata.created().ok(),
                uid: Some(metadata.uid()),
                gid: Some(metadata.gid()),
                mode: Some(metadata.mode()),
                dev: Some(metadata.dev()),
                ino: Some(metadata.ino()),
                nlink: Some(metadata.nlink()),
                rdev: Some(metadata.rdev()),
                blksize: Some(metadata.blksize()),
                blocks: Some(metadata.blocks()),
                is_block_device: file_type.is_block_device(),
                is_char_device: file_type.is_char_device(),
                is_fifo: file_type.is_fifo(),
                is_socket: file_type.is_socket(),
            }
        }
        #[cfg(not(unix))]
        {
            Self {
                size: metadata.len(),
                atime: metadata.accessed().ok(),
                mtime: metadata.modified().ok(),
                ctime: None,
                birthtime: metadata.created().ok(),
                uid: None,
                gid: None,
                mode: None,
                dev: None,
                ino: None,
                nlink: None,
                rdev: None,
                blksize: None,
                blocks: None,
                is_block_device: false,
                is_char_device: false,
                is_fifo: false,
                is_socket: false,
            }
        }
    }
}

/// A [`WalkEntry`] together with its extended status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalkEntryExtra {
    /// The entry itself.
    #[serde(flatten)]
    pub entry: WalkEntry,
    /// Extended status from the extra `lstat`.
    pub info: EntryInfo,
}
