//! Error types shared across the crate.

use std::io;
use std::path::PathBuf;

use crate::entity::EntityKind;

/// Error type for all filesystem operations in this crate.
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// I/O error with the path it occurred at.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The walk root (or an operation argument) is not a directory.
    #[error("path {0} is not a directory")]
    NotADirectory(PathBuf),

    /// The walk root is a symlink to a directory but symlink-directory
    /// traversal is disabled in the configuration.
    #[error("path {0} is a symlink directory but walking it is forbidden")]
    SymlinkRootForbidden(PathBuf),

    /// An entity could not be classified as a directory, file, or symlink.
    #[error("path {0} has an unknown entity type")]
    UnknownEntityType(PathBuf),

    /// A path already exists with a kind other than the one being ensured.
    #[error("cannot ensure {expected} at {path}: path is a {actual}")]
    EnsureConflict {
        /// The path being ensured.
        path: PathBuf,
        /// The kind the caller asked for.
        expected: EntityKind,
        /// The kind found on disk.
        actual: EntityKind,
    },

    /// Mutually exclusive options were both enabled.
    #[error("options `is_directory` and `is_file` are mutually exclusive")]
    ConflictingOptions,

    /// The same relative path was produced twice by one walk.
    #[error("path {0} was walked twice in a single traversal")]
    DuplicateEntry(PathBuf),

    /// One or more children of a directory could not be removed.
    #[error("unable to empty the directory {path}: {} removal(s) failed", .failures.len())]
    EmptyDirFailed {
        /// The directory being emptied.
        path: PathBuf,
        /// Per-child removal failures.
        failures: Vec<(PathBuf, io::Error)>,
    },
}

impl FsError {
    /// Creates an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error wraps `io::ErrorKind::PermissionDenied`.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::PermissionDenied)
    }
}

/// Extension trait for mapping I/O results to [`FsError`] with path context.
pub(crate) trait IoResultExt<T> {
    /// Maps an I/O error to [`FsError::Io`] with the given path.
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T, FsError>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T, FsError> {
        self.map_err(|e| FsError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_carries_path() {
        let error = FsError::io(
            "/path/to/file",
            io::Error::new(io::ErrorKind::NotFound, "not found"),
        );
        let display = format!("{error}");
        assert!(display.contains("/path/to/file"));
    }

    #[test]
    fn test_is_permission_denied() {
        let denied = FsError::io(
            "/locked",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(denied.is_permission_denied());

        let missing = FsError::io("/gone", io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(!missing.is_permission_denied());
        assert!(!FsError::ConflictingOptions.is_permission_denied());
    }

    #[test]
    fn test_ensure_conflict_display() {
        let error = FsError::EnsureConflict {
            path: PathBuf::from("/tmp/x"),
            expected: EntityKind::Directory,
            actual: EntityKind::File,
        };
        let display = format!("{error}");
        assert!(display.contains("directory"));
        assert!(display.contains("file"));
    }
}
