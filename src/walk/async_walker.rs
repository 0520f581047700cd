//! The suspending tree walker.
//!
//! Same frame-stack traversal as the blocking walker, with every
//! filesystem call a suspension point. For one tree and configuration the
//! two walkers produce the same entries with the same field values; only
//! the execution model differs.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, trace, warn};

use crate::entity::EntityKind;
use crate::error::{FsError, IoResultExt};
use crate::path_util;

use super::config::{OnPermissionDenied, WalkConfig};
use super::entry::{EntryInfo, WalkEntry, WalkEntryExtra, WalkEntryKind};
use super::filter::is_entry_yieldable;
use super::walker::classify_root;

struct AsyncDirFrame {
    read_dir: fs::ReadDir,
    relative: PathBuf,
    depth: usize,
    via_symlink: bool,
    origin: Option<WalkEntry>,
}

struct PendingDescend {
    entry: WalkEntry,
    depth: usize,
    via_symlink: bool,
}

/// Suspending walk over a directory tree.
///
/// Pump with [`next_entry`](Self::next_entry), the shape of
/// [`tokio::fs::ReadDir::next_entry`]:
///
/// ```no_run
/// # async fn demo() -> Result<(), fswalk::FsError> {
/// let config = fswalk::WalkConfig::new();
/// let mut walk = fswalk::AsyncWalk::new("/some/root", &config).await?;
/// while let Some(entry) = walk.next_entry().await? {
///     println!("{}", entry.path_relative.display());
/// }
/// # Ok(())
/// # }
/// ```
pub struct AsyncWalk<'a> {
    root: PathBuf,
    config: &'a WalkConfig,
    extensions: Option<Vec<String>>,
    frames: Vec<AsyncDirFrame>,
    pending: Option<PendingDescend>,
}

impl<'a> AsyncWalk<'a> {
    /// Validate the root and open the first directory handle. Root
    /// semantics match [`Walk::new`](super::walker::Walk::new).
    pub async fn new(root: impl AsRef<Path>, config: &'a WalkConfig) -> Result<Self, FsError> {
        let root = path_util::resolve_absolute(root.as_ref())
            .with_path(root.as_ref().to_path_buf())
            .map(|resolved| path_util::normalize_lexically(&resolved))?;
        let via_symlink = validate_root(&root, config).await?;
        debug!(root = %root.display(), depth = ?config.depth, "starting async walk");
        let read_dir = fs::read_dir(&root).await.with_path(&root)?;
        Ok(Self {
            root,
            config,
            extensions: config.normalized_extensions(),
            frames: vec![AsyncDirFrame {
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

    /// Produce the next accepted entry, or `None` when the walk is done.
    /// After an error the walk is finished and keeps returning `Ok(None)`.
    pub async fn next_entry(&mut self) -> Result<Option<WalkEntry>, FsError> {
        loop {
            if let Some(pending) = self.pending.take() {
                match fs::read_dir(&pending.entry.path_absolute).await {
                    Ok(read_dir) => {
                        trace!(path = %pending.entry.path_relative.display(), "descending");
                        self.frames.push(AsyncDirFrame {
                            read_dir,
                            relative: pending.entry.path_relative.clone(),
                            depth: pending.depth,
                            via_symlink: pending.via_symlink,
                            origin: Some(pending.entry),
                        });
                    }
                    Err(e) if e.kind() == ErrorKind::PermissionDenied => {
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
                                return Err(FsError::io(pending.entry.path_absolute, e));
                            }
                        }
                    }
                    Err(e) => {
                        self.frames.clear();
                        return Err(FsError::io(pending.entry.path_absolute, e));
                    }
                }
            }

            let Some(frame) = self.frames.last_mut() else {
                return Ok(None);
            };
            let dir_absolute = self.root.join(&frame.relative);
            let (relative_dir, depth, via_symlink) =
                (frame.relative.clone(), frame.depth, frame.via_symlink);

            let dirent = match frame.read_dir.next_entry().await {
                Ok(None) => {
                    self.frames.pop();
                    continue;
                }
                Ok(Some(dirent)) => dirent,
                Err(e) => {
                    self.absorb(FsError::io(dir_absolute, e))?;
                    continue;
                }
            };

            let name = dirent.file_name().to_string_lossy().into_owned();
            let file_type = match dirent.file_type().await {
                Ok(file_type) => file_type,
                Err(e) => {
                    self.absorb(FsError::io(dirent.path(), e))?;
                    continue;
                }
            };

            let built = self
                .build_entry(name, file_type, &relative_dir, depth, via_symlink)
                .await;
            let (entry, descend) = match built {
                Ok(built) => built,
                Err(error) => {
                    self.absorb(error)?;
                    continue;
                }
            };

            if descend {
                self.pending = Some(PendingDescend {
                    depth: depth + 1,
                    via_symlink: via_symlink || entry.is_symlink_directory(),
                    entry: entry.clone(),
                });
            }

            if is_entry_yieldable(&entry, self.config, self.extensions.as_deref()) {
                return Ok(Some(entry));
            }
        }
    }

    /// Drain the walk into a vector.
    pub async fn collect_entries(mut self) -> Result<Vec<WalkEntry>, FsError> {
        let mut entries = Vec::new();
        while let Some(entry) = self.next_entry().await? {
            entries.push(entry);
        }
        Ok(entries)
    }

    async fn build_entry(
        &self,
        name: String,
        file_type: std::fs::FileType,
        relative_dir: &Path,
        depth: usize,
        via_symlink: bool,
    ) -> Result<(WalkEntry, bool), FsError> {
        let path_relative = relative_dir.join(&name);
        let path_absolute = self.root.join(&path_relative);

        let listed = EntityKind::of_file_type(file_type);
        let (path_absolute_real, dangling) = match fs::canonicalize(&path_absolute).await {
            Ok(real) => (real, false),
            Err(e) if e.kind() == ErrorKind::NotFound && listed.is_symlink() => {
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
                    .await
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
        let may_recurse = self.config.depth.is_none_or(|limit| depth < limit);
        let descend = (entry.is_directory()
            || (entry.is_symlink_directory() && self.config.walk_symlink_directories))
            && may_recurse;
        Ok((entry, descend))
    }

    /// Try to absorb an error under the permission policy. On success the
    /// offending subtree has been skipped and the walk continues;
    /// otherwise the walk is finished and the error is returned.
    fn absorb(&mut self, error: FsError) -> Result<(), FsError> {
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
                    return Ok(());
                }
            }
        }
        self.frames.clear();
        Err(error)
    }
}

/// Suspending walk yielding entries with extended status.
pub struct AsyncWalkWithInfo<'a> {
    inner: AsyncWalk<'a>,
}

impl<'a> AsyncWalkWithInfo<'a> {
    /// See [`AsyncWalk::new`].
    pub async fn new(root: impl AsRef<Path>, config: &'a WalkConfig) -> Result<Self, FsError> {
        Ok(Self {
            inner: AsyncWalk::new(root, config).await?,
        })
    }

    /// The resolved absolute root of this walk.
    pub fn root(&self) -> &Path {
        self.inner.root()
    }

    /// Produce the next accepted entry with its extended status.
    pub async fn next_entry(&mut self) -> Result<Option<WalkEntryExtra>, FsError> {
        let Some(entry) = self.inner.next_entry().await? else {
            return Ok(None);
        };
        let metadata = match fs::symlink_metadata(&entry.path_absolute).await {
            Ok(metadata) => metadata,
            Err(e) => {
                self.inner.frames.clear();
                return Err(FsError::io(entry.path_absolute, e));
            }
        };
        Ok(Some(WalkEntryExtra {
            info: EntryInfo::from_metadata(&metadata),
            entry,
        }))
    }

    /// Drain the walk into a vector.
    pub async fn collect_entries(mut self) -> Result<Vec<WalkEntryExtra>, FsError> {
        let mut entries = Vec::new();
        while let Some(entry) = self.next_entry().await? {
            entries.push(entry);
        }
        Ok(entries)
    }
}

async fn validate_root(root: &Path, config: &WalkConfig) -> Result<bool, FsError> {
    let root_meta = fs::symlink_metadata(root).await.with_path(root)?;
    let target_meta = if root_meta.file_type().is_symlink() {
        Some(fs::metadata(root).await.with_path(root)?)
    } else {
        None
    };
    classify_root(root, &root_meta, target_meta.as_ref(), config)
}
