//! The blocking tree walker.
//!
//! Traversal is pull-based: a stack of directory frames, each owning one
//! live `ReadDir` handle, is pumped one entry per `next()` call. Handles
//! are released as soon as a frame is exhausted, abandoned after a denied
//! subtree, or the walker itself is dropped mid-iteration.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::entity::EntityKind;
use crate::error::{FsError, IoResultExt};
use crate::path_util;

use super::config::{OnPermissionDenied, WalkConfig};
use super::entry::{EntryInfo, WalkEntry, WalkEntryExtra, WalkEntryKind};
use super::filter::is_entry_yieldable;

/// One pending directory level.
struct DirFrame {
    read_dir: fs::ReadDir,
    /// Directory path relative to the walk root; empty for the root frame.
    relative: PathBuf,
    /// Depth of this level's entries; root children are depth 0.
    depth: usize,
    via_symlink: bool,
    /// The entry whose recursion opened this frame. The root frame has
    /// none, which is what makes root-level errors non-absorbable.
    origin: Option<WalkEntry>,
}

/// A descend decided for an already-yielded entry; the child listing is
/// opened on the next pump so the entry reaches the caller first.
struct PendingDescend {
    entry: WalkEntry,
    depth: usize,
    via_symlink: bool,
}

/// Blocking walk over a directory tree, yielding entries lazily.
///
/// Iteration order is parents before their own children, siblings in
/// whatever order the platform lists them; no sorting is applied. After an
/// error the iterator is fused.
pub struct Walk<'a> {
    root: PathBuf,
    config: &'a WalkConfig,
    extensions: Option<Vec<String>>,
    frames: Vec<DirFrame>,
    pending: Option<PendingDescend>,
}

impl<'a> Walk<'a> {
    /// Validate the root and open the first directory handle.
    ///
    /// The root must be a directory, or a symlink to one when
    /// `walk_symlink_directories` is enabled; anything else fails here,
    /// before any entry is produced.
    pub fn new(root: impl AsRef<Path>, config: &'a WalkConfig) -> Result<Self, FsError> {
        let root = path_util::resolve_absolute(root.as_ref())
            .with_path(root.as_ref().to_path_buf())
            .map(|resolved| path_util::normalize_lexically(&resolved))?;
        let via_symlink = validate_root_sync(&root, config)?;
        debug!(root = %root.display(), depth = ?config.depth, "starting walk");
        let read_dir = fs::read_dir(&root).with_path(&root)?;
        Ok(Self {
            root,
            config,
            extensions: config.normalized_extensions(),
            frames: vec![DirFrame {
                read_dir,
                relative: PathBuf::new(),
                depth: 0,
                via_symlink,
                origin: None,
            }],
            pending: None,
        })
    }

    /// The resolved absolute root of this walk.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether entries at `depth` may still be recursed into.
    fn may_recurse(&self, depth: usize) -> bool {
        self.config.depth.is_none_or(|limit| depth < limit)
    }

    /// Classify one listed child and assemble its entry, plus whether the
    /// walker should descend into it.
    fn build_entry(
        &self,
        name: String,
        file_type: fs::FileType,
        relative_dir: &Path,
        depth: usize,
        via_symlink: bool,
    ) -> Result<(WalkEntry, bool), FsError> {
        let path_relative = relative_dir.join(&name);
        let path_absolute = self.root.join(&path_relative);

        let listed = EntityKind::of_file_type(file_type);
        let (path_absolute_real, dangling) = match fs::canonicalize(&path_absolute) {
            Ok(real) => (real, false),
            // A dangling symlink has no canonical target; the lexical
            // absolute path stands in and the entry classifies as a
            // symlink file below.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && listed.is_symlink() => {
                (path_absolute.clone(), true)
            }
            Err(e) => return Err(FsError::io(&path_absolute, e)),
        };
        let path_relative_real = path_util::relative_from(&path_absolute_real, &self.root);

        let kind = match listed {
            EntityKind::Directory => WalkEntryKind::Directory,
            EntityKind::File => WalkEntryKind::File,
            EntityKind::Symlink if dangling => WalkEntryKind::SymlinkFile,
            EntityKind::Symlink => {
                let target = fs::symlink_metadata(&path_absolute_real)
                    .with_path(&path_absolute_real)?;
                match EntityKind::of_metadata(&target) {
                    EntityKind::Directory => WalkEntryKind::SymlinkDirectory,
                    EntityKind::File => WalkEntryKind::SymlinkFile,
                    _ => return Err(FsError::UnknownEntityType(path_absolute)),
                }
            }
            EntityKind::Unknown => return Err(FsError::UnknownEntityType(path_absolute)),
        };

        let entry = WalkEntry {
            name,
            path_absolute,
            path_absolute_real,
            path_relative,
            path_relative_real,
            kind,
            via_symlink_directory: via_symlink,
        };
        let descend = (entry.is_directory()
            || (entry.is_symlink_directory() && self.config.walk_symlink_directories))
            && self.may_recurse(depth);
        Ok((entry, descend))
    }

    /// Handle an error raised while pumping the top frame: permission
    /// errors inside a recursed subtree are reported to the configured
    /// callback and the subtree abandoned; everything else ends the walk.
    fn absorb_or_fail(&mut self, error: FsError) -> Option<Result<WalkEntry, FsError>> {
        if error.is_permission_denied() {
            if let OnPermissionDenied::Notify(callback) = &self.config.on_permission_denied {
                if let Some(origin) = self.frames.last().and_then(|frame| frame.origin.as_ref())
                {
                    warn!(
                        path = %origin.path_absolute.display(),
                        "skipping subtree after permission error"
                    );
                    callback(origin);
                    self.frames.pop();
                    return None;
                }
            }
        }
        self.frames.clear();
        Some(Err(error))
    }
}

impl Iterator for Walk<'_> {
    type Item = Result<WalkEntry, FsError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            // A descend decided on the previous pump opens its listing
            // now, after its entry has already reached the caller.
            if let Some(pending) = self.pending.take() {
                match fs::read_dir(&pending.entry.path_absolute) {
                    Ok(read_dir) => {
                        trace!(path = %pending.entry.path_relative.display(), "descending");
                        self.frames.push(DirFrame {
                            read_dir,
                            relative: pending.entry.path_relative.clone(),
                            depth: pending.depth,
                            via_symlink: pending.via_symlink,
                            origin: Some(pending.entry),
                        });
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                        // Opening a child listing is already "inside" the
                        // child's subtree, so the callback policy applies
                        // even at root level.
                        match &self.config.on_permission_denied {
                            OnPermissionDenied::Notify(callback) => {
                                warn!(
                                    path = %pending.entry.path_absolute.display(),
                                    "skipping unreadable directory"
                                );
                                callback(&pending.entry);
                            }
                            OnPermissionDenied::Fail => {
                                self.frames.clear();
                                return Some(Err(FsError::io(pending.entry.path_absolute, e)));
                            }
                        }
                    }
                    Err(e) => {
                        self.frames.clear();
                        return Some(Err(FsError::io(pending.entry.path_absolute, e)));
                    }
                }
            }

            let frame = self.frames.last_mut()?;
            let dir_absolute = self.root.join(&frame.relative);
            let (relative_dir, depth, via_symlink) =
                (frame.relative.clone(), frame.depth, frame.via_symlink);

            let dirent = match frame.read_dir.next() {
                None => {
                    self.frames.pop();
                    continue;
                }
                Some(Ok(dirent)) => dirent,
                Some(Err(e)) => match self.absorb_or_fail(FsError::io(dir_absolute, e)) {
                    Some(result) => return Some(result),
                    None => continue,
                },
            };

            let name = dirent.file_name().to_string_lossy().into_owned();
            let file_type = match dirent.file_type() {
                Ok(file_type) => file_type,
                Err(e) => {
                    match self.absorb_or_fail(FsError::io(dirent.path(), e)) {
                        Some(result) => return Some(result),
                        None => continue,
                    }
                }
            };

            let (entry, descend) =
                match self.build_entry(name, file_type, &relative_dir, depth, via_symlink) {
                    Ok(built) => built,
                    Err(error) => match self.absorb_or_fail(error) {
                        Some(result) => return Some(result),
                        None => continue,
                    },
                };

            if descend {
                self.pending = Some(PendingDescend {
                    depth: depth + 1,
                    via_symlink: via_symlink || entry.is_symlink_directory(),
                    entry: entry.clone(),
                });
            }

            if is_entry_yieldable(&entry, self.config, self.extensions.as_deref()) {
                return Some(Ok(entry));
            }
        }
    }
}

/// Blocking walk yielding entries with extended status.
///
/// Identical traversal to [`Walk`]; each accepted entry costs one extra
/// `lstat`.
pub struct WalkWithInfo<'a> {
    inner: Walk<'a>,
}

impl<'a> WalkWithInfo<'a> {
    /// See [`Walk::new`] for root validation semantics.
    pub fn new(root: impl AsRef<Path>, config: &'a WalkConfig) -> Result<Self, FsError> {
        Ok(Self {
            inner: Walk::new(root, config)?,
        })
    }

    /// The resolved absolute root of this walk.
    pub fn root(&self) -> &Path {
        self.inner.root()
    }
}

impl Iterator for WalkWithInfo<'_> {
    type Item = Result<WalkEntryExtra, FsError>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = match self.inner.next()? {
            Ok(entry) => entry,
            Err(error) => return Some(Err(error)),
        };
        let metadata = match fs::symlink_metadata(&entry.path_absolute) {
            Ok(metadata) => metadata,
            Err(e) => {
                self.inner.frames.clear();
                return Some(Err(FsError::io(entry.path_absolute, e)));
            }
        };
        Some(Ok(WalkEntryExtra {
            info: EntryInfo::from_metadata(&metadata),
            entry,
        }))
    }
}

/// Check the root the way the walkers require it, returning whether the
/// walk starts through a symlink directory.
pub(crate) fn classify_root(
    root: &Path,
    root_meta: &fs::Metadata,
    target_meta: Option<&fs::Metadata>,
    config: &WalkConfig,
) -> Result<bool, FsError> {
    match EntityKind::of_metadata(root_meta) {
        EntityKind::Directory => Ok(false),
        EntityKind::Symlink => {
            let target = target_meta.ok_or_else(|| FsError::NotADirectory(root.to_path_buf()))?;
            if !target.is_dir() {
                return Err(FsError::NotADirectory(root.to_path_buf()));
            }
            if !config.walk_symlink_directories {
                return Err(FsError::SymlinkRootForbidden(root.to_path_buf()));
            }
            Ok(true)
        }
        _ => Err(FsError::NotADirectory(root.to_path_buf())),
    }
}

fn validate_root_sync(root: &Path, config: &WalkConfig) -> Result<bool, FsError> {
    let root_meta = fs::symlink_metadata(root).with_path(root)?;
    let target_meta = if root_meta.file_type().is_symlink() {
        Some(fs::metadata(root).with_path(root)?)
    } else {
        None
    };
    classify_root(root, &root_meta, target_meta.as_ref(), config)
}
