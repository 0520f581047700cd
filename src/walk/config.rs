//! Configuration types for tree walking.

use std::fmt;

use regex::Regex;

use super::entry::WalkEntry;

/// What to do when recursion into a subtree hits a permission error.
pub enum OnPermissionDenied {
    /// Propagate the error and terminate the walk.
    Fail,
    /// Invoke the callback with the entry whose subtree was denied, skip
    /// that subtree, and continue the walk at the current level.
    Notify(Box<dyn Fn(&WalkEntry) + Send + Sync>),
}

impl OnPermissionDenied {
    /// Convenience constructor wrapping a callback.
    pub fn notify(callback: impl Fn(&WalkEntry) + Send + Sync + 'static) -> Self {
        Self::Notify(Box::new(callback))
    }
}

impl Default for OnPermissionDenied {
    fn default() -> Self {
        Self::Fail
    }
}

impl fmt::Debug for OnPermissionDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fail => f.write_str("Fail"),
            Self::Notify(_) => f.write_str("Notify(..)"),
        }
    }
}

/// Configuration for one walk. Constructed once per call, read-only after.
#[derive(Debug)]
pub struct WalkConfig {
    /// Maximum recursion depth. `None` walks without bound; `Some(0)`
    /// yields only the root's immediate children.
    pub depth: Option<usize>,
    /// Include entries by file extension, case-insensitively. Only
    /// file and symlink-file entries can pass when a list is configured;
    /// an empty list admits only extensionless names.
    pub extensions: Option<Vec<String>>,
    /// Whether to yield real directory entries.
    pub include_directories: bool,
    /// Whether to yield real file entries.
    pub include_files: bool,
    /// Whether to yield symlink-directory entries.
    pub include_symlink_directories: bool,
    /// Whether to yield symlink-file entries.
    pub include_symlink_files: bool,
    /// Include entries whose relative path matches any of these patterns.
    /// `Some(vec![])` matches nothing.
    pub matches: Option<Vec<Regex>>,
    /// Exclude entries whose relative path matches any of these patterns.
    pub skips: Option<Vec<Regex>>,
    /// Handling of permission errors raised inside recursed subtrees.
    pub on_permission_denied: OnPermissionDenied,
    /// Whether symlink directories are recursed into like real ones.
    /// A self-referential symlink tree then loops until `depth` (or a host
    /// resource limit) is reached.
    pub walk_symlink_directories: bool,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl WalkConfig {
    /// The default configuration: unbounded depth, every kind included,
    /// no filters, permission errors fatal, symlink directories not walked.
    pub fn new() -> Self {
        Self {
            depth: None,
            extensions: None,
            include_directories: true,
            include_files: true,
            include_symlink_directories: true,
            include_symlink_files: true,
            matches: None,
            skips: None,
            on_permission_denied: OnPermissionDenied::Fail,
            walk_symlink_directories: false,
        }
    }

    /// Extension allow-list normalized the way the filter expects it:
    /// lowercase, with a leading dot.
    pub(crate) fn normalized_extensions(&self) -> Option<Vec<String>> {
        self.extensions.as_ref().map(|extensions| {
            extensions
                .iter()
                .map(|extension| {
                    let lower = extension.to_lowercase();
                    if lower.starts_with('.') {
                        lower
                    } else {
                        format!(".{lower}")
                    }
                })
                .collect()
        })
    }
}
