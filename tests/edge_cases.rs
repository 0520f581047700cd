//! Edge case and error handling tests for fswalk

use std::path::PathBuf;

use fswalk::test_utils::TestTree;
use fswalk::{FsError, OnPermissionDenied, Walk, WalkConfig, WalkEntry, get_hash};

fn walk_all(root: &std::path::Path, config: &WalkConfig) -> Vec<WalkEntry> {
    Walk::new(root, config)
        .expect("walk should start")
        .map(|e| e.expect("walk should not fail"))
        .collect()
}

// ============================================================================
// Symlink Classification
// ============================================================================

#[cfg(unix)]
#[test]
fn test_symlink_to_file_classification() {
    let tree = TestTree::new();
    let target = tree.add_file("target.txt", "data");
    tree.add_symlink("target.txt", "link.txt");

    let entries = walk_all(tree.path(), &WalkConfig::new());
    let link = entries.iter().find(|e| e.name == "link.txt").unwrap();
    assert!(link.is_symlink_file());
    assert_eq!(link.path_absolute, tree.path().join("link.txt"));
    // The canonical path resolves through the link to the target.
    assert_eq!(
        link.path_absolute_real,
        target.canonicalize().unwrap()
    );
    assert_eq!(link.path_relative, PathBuf::from("link.txt"));
    assert_eq!(link.path_relative_real, PathBuf::from("target.txt"));
}

#[cfg(unix)]
#[test]
fn test_symlink_to_directory_not_recursed_by_default() {
    let tree = TestTree::new();
    tree.add_file("real/inner.txt", "x");
    tree.add_symlink("real", "linkdir");

    let entries = walk_all(tree.path(), &WalkConfig::new());
    let link = entries.iter().find(|e| e.name == "linkdir").unwrap();
    assert!(link.is_symlink_directory());
    // The symlink directory was yielded but not entered.
    assert!(
        !entries
            .iter()
            .any(|e| e.path_relative.starts_with("linkdir") && e.name == "inner.txt")
    );
}

#[cfg(unix)]
#[test]
fn test_via_symlink_directory_propagates() {
    let tree = TestTree::new();
    tree.add_file("real/sub/inner.txt", "x");
    tree.add_symlink("real", "linkdir");

    let config = WalkConfig {
        walk_symlink_directories: true,
        ..WalkConfig::new()
    };
    let entries = walk_all(tree.path(), &config);

    // Everything below the symlink directory is marked, including entries
    // reached through real directories further down.
    let through_link: Vec<_> = entries
        .iter()
        .filter(|e| {
            e.path_relative.starts_with("linkdir") && e.path_relative != PathBuf::from("linkdir")
        })
        .collect();
    assert_eq!(through_link.len(), 2, "sub and sub/inner.txt");
    assert!(through_link.iter().all(|e| e.via_symlink_directory));

    // The symlink directory entry itself and the direct subtree are not.
    let direct: Vec<_> = entries
        .iter()
        .filter(|e| e.path_relative.starts_with("real") || e.name == "linkdir")
        .collect();
    assert!(direct.iter().all(|e| !e.via_symlink_directory));
}

#[cfg(unix)]
#[test]
fn test_dangling_symlink_is_a_symlink_file() {
    let tree = TestTree::new();
    tree.add_symlink("vanished", "broken");

    let entries = walk_all(tree.path(), &WalkConfig::new());
    assert_eq!(entries.len(), 1);
    assert!(entries[0].is_symlink_file());
    assert_eq!(entries[0].path_absolute_real, entries[0].path_absolute);
}

#[cfg(unix)]
#[test]
fn test_symlink_cycle_is_bounded_by_depth() {
    let tree = TestTree::new();
    tree.add_file("top/file.txt", "x");
    tree.add_symlink("top", "top/loop");

    let config = WalkConfig {
        walk_symlink_directories: true,
        depth: Some(3),
        ..WalkConfig::new()
    };
    let entries = walk_all(tree.path(), &config);

    // The loop unrolls once per depth level and then stops.
    assert!(entries.iter().any(|e| e.path_relative == PathBuf::from("top/loop/loop")));
    assert!(entries.len() < 20);
}

#[cfg(unix)]
#[test]
fn test_symlink_root() {
    let tree = TestTree::new();
    tree.add_file("real/inner.txt", "x");
    let link = tree.add_symlink("real", "rootlink");

    let config = WalkConfig::new();
    assert!(matches!(
        Walk::new(&link, &config),
        Err(FsError::SymlinkRootForbidden(_))
    ));

    let config = WalkConfig {
        walk_symlink_directories: true,
        ..WalkConfig::new()
    };
    let entries = walk_all(&link, &config);
    assert_eq!(entries.len(), 1);
    assert!(entries[0].via_symlink_directory);
}

// ============================================================================
// Unknown Entities
// ============================================================================

#[cfg(unix)]
#[test]
fn test_socket_fails_the_walk() {
    use std::os::unix::net::UnixListener;

    let tree = TestTree::new();
    tree.add_file("ok.txt", "x");
    let _listener = UnixListener::bind(tree.path().join("ipc.sock")).unwrap();

    let config = WalkConfig::new();
    let result: Result<Vec<_>, _> = Walk::new(tree.path(), &config).unwrap().collect();
    assert!(matches!(result, Err(FsError::UnknownEntityType(_))));
}

#[cfg(unix)]
#[test]
fn test_hash_of_socket_fails() {
    use std::os::unix::net::UnixListener;

    let tree = TestTree::new();
    let sock = tree.path().join("ipc.sock");
    let _listener = UnixListener::bind(&sock).unwrap();

    assert!(matches!(
        get_hash(&sock),
        Err(FsError::UnknownEntityType(_))
    ));
}

// ============================================================================
// Permission Denied Policies
// ============================================================================

#[cfg(unix)]
fn running_as_root() -> bool {
    // Root ignores permission bits, so denied-subtree tests are
    // meaningless under uid 0 (e.g. in containers).
    unsafe { libc::geteuid() == 0 }
}

#[cfg(unix)]
struct ModeGuard {
    path: PathBuf,
}

#[cfg(unix)]
impl Drop for ModeGuard {
    fn drop(&mut self) {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(
            &self.path,
            std::fs::Permissions::from_mode(0o755),
        );
    }
}

#[cfg(unix)]
fn deny_access(path: &std::path::Path) -> ModeGuard {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o000)).unwrap();
    ModeGuard {
        path: path.to_path_buf(),
    }
}

#[cfg(unix)]
#[test]
fn test_permission_denied_callback_continues_walk() {
    use std::sync::{Arc, Mutex};

    if running_as_root() {
        eprintln!("skipping: running as root");
        return;
    }

    let tree = TestTree::new();
    tree.add_file("open/ok.txt", "x");
    tree.add_file("locked/secret.txt", "y");
    let _guard = deny_access(&tree.path().join("locked"));

    let denied = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&denied);
    let config = WalkConfig {
        on_permission_denied: OnPermissionDenied::notify(move |entry: &WalkEntry| {
            sink.lock().unwrap().push(entry.path_relative.clone());
        }),
        ..WalkConfig::new()
    };

    let entries = walk_all(tree.path(), &config);
    let denied = denied.lock().unwrap().clone();

    // The callback fired exactly once, for the denied subtree root.
    assert_eq!(denied, vec![PathBuf::from("locked")]);
    // Accessible parts were still walked, the denied dir itself included.
    let names: Vec<_> = entries.iter().map(|e| e.path_relative.clone()).collect();
    assert!(names.contains(&PathBuf::from("open/ok.txt")));
    assert!(names.contains(&PathBuf::from("locked")));
    assert!(!names.contains(&PathBuf::from("locked/secret.txt")));
}

#[cfg(unix)]
#[test]
fn test_permission_denied_fail_policy_aborts() {
    if running_as_root() {
        eprintln!("skipping: running as root");
        return;
    }

    let tree = TestTree::new();
    tree.add_file("locked/secret.txt", "y");
    let _guard = deny_access(&tree.path().join("locked"));

    let config = WalkConfig::new();
    let result: Result<Vec<_>, _> = Walk::new(tree.path(), &config).unwrap().collect();
    let error = result.unwrap_err();
    assert!(error.is_permission_denied());
}

// ============================================================================
// Misc
// ============================================================================

#[test]
fn test_walk_iterator_fuses_after_error() {
    let tree = TestTree::new();
    tree.add_file("a.txt", "x");

    let config = WalkConfig::new();
    let mut walk = Walk::new(tree.path(), &config).unwrap();
    // Drain fully; a fresh walk over a sane tree has no error, so fusing
    // is observed as plain termination.
    while let Some(entry) = walk.next() {
        entry.unwrap();
    }
    assert!(walk.next().is_none());
    assert!(walk.next().is_none());
}

#[test]
fn test_names_with_spaces_and_unicode() {
    let tree = TestTree::new();
    tree.add_file("with space.txt", "x");
    tree.add_file("días/niño.txt", "y");

    let entries = walk_all(tree.path(), &WalkConfig::new());
    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert!(names.contains(&"with space.txt"));
    assert!(names.contains(&"niño.txt"));
}
