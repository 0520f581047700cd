//! fswalk - Symlink-aware directory walking with hashing, sizing, and diffing

pub mod compare;
pub mod empty;
pub mod ensure;
pub mod entity;
pub mod error;
pub mod exist;
pub mod hash;
pub mod path_util;
pub mod size;
pub mod walk;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use compare::{
    DirDiff, compare_directories, compare_directories_async, compare_files_differ,
    compare_files_differ_async, compare_symlinks_differ, compare_symlinks_differ_async,
};
pub use empty::{empty_dir, empty_dir_async};
pub use ensure::{
    ensure_dir, ensure_dir_async, ensure_file, ensure_file_async, ensure_link, ensure_link_async,
    ensure_symlink, ensure_symlink_async,
};
pub use entity::EntityKind;
pub use error::FsError;
pub use exist::{ExistsOptions, exists, exists_async};
pub use hash::{get_hash, get_hash_async};
pub use size::{get_size, get_size_async};
pub use walk::{
    AsyncWalk, AsyncWalkWithInfo, EntryInfo, OnPermissionDenied, Walk, WalkConfig, WalkEntry,
    WalkEntryExtra, WalkEntryKind, WalkWithInfo,
};
