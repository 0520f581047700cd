//! Path reference handling: `file://` URLs, absolute resolution, and
//! lexical normalization.
//!
//! Everything here is a pure string/path transform; the only I/O is the
//! optional working-directory lookup, which callers can bypass by passing
//! an explicit base so tests can pin the working directory.

use std::env;
use std::io;
use std::path::{Component, Path, PathBuf};

use url::Url;

/// Convert a path reference to a plain [`PathBuf`].
///
/// Accepts either a filesystem path or a `file://` URL. Anything that is
/// not a well-formed `file://` URL is treated as a plain path, including
/// strings that merely look scheme-like (e.g. Windows drive prefixes).
pub fn to_path_buf(reference: &str) -> PathBuf {
    if reference.starts_with("file://") {
        if let Ok(url) = Url::parse(reference) {
            if let Ok(path) = url.to_file_path() {
                return path;
            }
        }
    }
    PathBuf::from(reference)
}

/// Resolve a path against the process working directory.
///
/// Already-absolute paths are returned as-is; no symlink resolution is
/// performed.
pub fn resolve_absolute(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(env::current_dir()?.join(path))
}

/// Resolve a path against an explicit base directory.
pub fn resolve_absolute_with(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Collapse `.` and `..` components without touching the filesystem.
///
/// Leading `..` components of a relative path are kept; `..` at an absolute
/// root is dropped, matching how shells resolve `/..`.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    let mut depth = 0usize;
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                out.push(component.as_os_str());
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth > 0 {
                    out.pop();
                    depth -= 1;
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(name) => {
                out.push(name);
                depth += 1;
            }
        }
    }
    out
}

/// Compare two path references for lexical equality.
///
/// Both sides are resolved against `base` and normalized, but symlinks are
/// not resolved: two different symlinks to the same target are not equal
/// under this check. Callers needing true identity should compare
/// canonical paths instead.
pub fn is_same_path(a: &Path, b: &Path, base: &Path) -> bool {
    normalize_lexically(&resolve_absolute_with(a, base))
        == normalize_lexically(&resolve_absolute_with(b, base))
}

/// Compute the lexical path from `base` to `path`.
///
/// Both inputs should be absolute. When `path` lies outside `base` the
/// result climbs with `..` components, so joining `base` with the result
/// always lands back on `path` (lexically).
pub fn relative_from(path: &Path, base: &Path) -> PathBuf {
    let path = normalize_lexically(path);
    let base = normalize_lexically(base);

    let mut path_components = path.components();
    let mut base_components = base.components();
    let mut out = PathBuf::new();

    loop {
        match (path_components.clone().next(), base_components.clone().next()) {
            (Some(p), Some(b)) if p == b => {
                path_components.next();
                base_components.next();
            }
            (_, None) => {
                out.extend(path_components);
                break;
            }
            (_, Some(_)) => {
                for _ in base_components.clone() {
                    out.push("..");
                }
                out.extend(path_components);
                break;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_path_buf_plain() {
        assert_eq!(to_path_buf("/tmp/a"), PathBuf::from("/tmp/a"));
        assert_eq!(to_path_buf("rel/b.txt"), PathBuf::from("rel/b.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn test_to_path_buf_file_url() {
        assert_eq!(to_path_buf("file:///tmp/a.txt"), PathBuf::from("/tmp/a.txt"));
        assert_eq!(
            to_path_buf("file:///with%20space"),
            PathBuf::from("/with space")
        );
    }

    #[test]
    fn test_resolve_absolute_with() {
        let base = Path::new("/base");
        assert_eq!(
            resolve_absolute_with(Path::new("x/y"), base),
            PathBuf::from("/base/x/y")
        );
        assert_eq!(
            resolve_absolute_with(Path::new("/abs"), base),
            PathBuf::from("/abs")
        );
    }

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(
            normalize_lexically(Path::new("/a/./b/../c")),
            PathBuf::from("/a/c")
        );
        assert_eq!(normalize_lexically(Path::new("/a/../..")), PathBuf::from("/"));
        assert_eq!(
            normalize_lexically(Path::new("../x/./y")),
            PathBuf::from("../x/y")
        );
        assert_eq!(normalize_lexically(Path::new("a/b/../../c")), PathBuf::from("c"));
    }

    #[test]
    fn test_is_same_path_is_lexical() {
        let base = Path::new("/work");
        assert!(is_same_path(Path::new("a/b"), Path::new("/work/a/./b"), base));
        assert!(is_same_path(
            Path::new("/work/a/../a/b"),
            Path::new("a/b"),
            base
        ));
        assert!(!is_same_path(Path::new("a"), Path::new("b"), base));
    }

    #[test]
    fn test_relative_from_inside_and_outside() {
        assert_eq!(
            relative_from(Path::new("/r/b/c.txt"), Path::new("/r")),
            PathBuf::from("b/c.txt")
        );
        assert_eq!(relative_from(Path::new("/r"), Path::new("/r")), PathBuf::new());
        assert_eq!(
            relative_from(Path::new("/other/x"), Path::new("/r/sub")),
            PathBuf::from("../../other/x")
        );
    }
}
