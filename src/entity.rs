//! Entity classification from filesystem status records.

use std::fmt;
use std::fs::{FileType, Metadata};

/// The kind of a filesystem entity, as reported by a status call.
///
/// Classification checks directory first, then file, then symlink, so an
/// inconsistent status record can never claim more than one kind and a
/// questionable object leans toward directory rather than plain file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Directory,
    File,
    Symlink,
    Unknown,
}

impl EntityKind {
    /// Classify from a [`FileType`], e.g. one taken from a directory listing.
    pub fn of_file_type(file_type: FileType) -> Self {
        if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_file() {
            Self::File
        } else if file_type.is_symlink() {
            Self::Symlink
        } else {
            Self::Unknown
        }
    }

    /// Classify from full [`Metadata`].
    pub fn of_metadata(metadata: &Metadata) -> Self {
        Self::of_file_type(metadata.file_type())
    }

    /// Returns true if this entity is a directory.
    pub fn is_directory(self) -> bool {
        self == Self::Directory
    }

    /// Returns true if this entity is a regular file.
    pub fn is_file(self) -> bool {
        self == Self::File
    }

    /// Returns true if this entity is a symbolic link.
    pub fn is_symlink(self) -> bool {
        self == Self::Symlink
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Directory => "directory",
            Self::File => "file",
            Self::Symlink => "symlink",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_classify_directory_and_file() {
        let dir = TempDir::new().unwrap();
        let file_path = dir.path().join("a.txt");
        fs::write(&file_path, "hello").unwrap();

        let dir_meta = fs::symlink_metadata(dir.path()).unwrap();
        assert_eq!(EntityKind::of_metadata(&dir_meta), EntityKind::Directory);
        assert!(EntityKind::of_metadata(&dir_meta).is_directory());

        let file_meta = fs::symlink_metadata(&file_path).unwrap();
        assert_eq!(EntityKind::of_metadata(&file_meta), EntityKind::File);
    }

    #[cfg(unix)]
    #[test]
    fn test_classify_symlink_without_following() {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new().unwrap();
        let target = dir.path().join("target.txt");
        let link = dir.path().join("link.txt");
        fs::write(&target, "x").unwrap();
        symlink(&target, &link).unwrap();

        // lstat sees the link itself, stat follows it.
        let lstat = fs::symlink_metadata(&link).unwrap();
        assert_eq!(EntityKind::of_metadata(&lstat), EntityKind::Symlink);
        let stat = fs::metadata(&link).unwrap();
        assert_eq!(EntityKind::of_metadata(&stat), EntityKind::File);
    }

    #[cfg(unix)]
    #[test]
    fn test_classify_socket_as_unknown() {
        use std::os::unix::net::UnixListener;

        let dir = TempDir::new().unwrap();
        let sock = dir.path().join("ipc.sock");
        let _listener = UnixListener::bind(&sock).unwrap();

        let meta = fs::symlink_metadata(&sock).unwrap();
        assert_eq!(EntityKind::of_metadata(&meta), EntityKind::Unknown);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(EntityKind::Directory.to_string(), "directory");
        assert_eq!(EntityKind::Unknown.to_string(), "unknown");
    }
}
