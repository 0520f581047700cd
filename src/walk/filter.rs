//! The yield-decision pipeline.
//!
//! Filters decide only whether an entry is handed to the caller. Recursion
//! into directories is decided separately by the walker, so a directory
//! filtered out here is still descended into.

use super::config::WalkConfig;
use super::entry::WalkEntry;

/// Decide whether an entry passes the configured filters.
///
/// Rules are applied in order and reject as soon as one fails: kind
/// toggles, then the extension allow-list, then inclusion patterns, then
/// exclusion patterns. `extensions` is the pre-normalized allow-list
/// (lowercase, leading dot) so per-entry checks stay allocation-free on
/// the config side.
pub(crate) fn is_entry_yieldable(
    entry: &WalkEntry,
    config: &WalkConfig,
    extensions: Option<&[String]>,
) -> bool {
    let included = match entry.kind {
        super::entry::WalkEntryKind::Directory => config.include_directories,
        super::entry::WalkEntryKind::File => config.include_files,
        super::entry::WalkEntryKind::SymlinkDirectory => config.include_symlink_directories,
        super::entry::WalkEntryKind::SymlinkFile => config.include_symlink_files,
    };
    if !included {
        return false;
    }

    if let Some(extensions) = extensions {
        if !entry.is_file_like() {
            return false;
        }
        let name_lower = entry.name.to_lowercase();
        if extensions.is_empty() {
            // An empty allow-list admits only extensionless names.
            if name_lower.contains('.') {
                return false;
            }
        } else if !extensions
            .iter()
            .any(|extension| name_lower.ends_with(extension.as_str()))
        {
            return false;
        }
    }

    if let Some(matches) = &config.matches {
        let relative = entry.path_relative.to_string_lossy();
        if !matches.iter().any(|pattern| pattern.is_match(&relative)) {
            return false;
        }
    }

    if let Some(skips) = &config.skips {
        let relative = entry.path_relative.to_string_lossy();
        if skips.iter().any(|pattern| pattern.is_match(&relative)) {
            return false;
        }
    }

    true
}
