//! Bounded-depth discovery of project manifests.
//!
//! Walks the tree from the scan root, pruning dependency caches
//! (`node_modules`) and dot-directories, and yields the path of every
//! `package.json` found within the depth bound. Manifests nested deeper
//! than the bound are silently skipped; that is the cost ceiling, not a
//! bug. Unreadable directories are logged and skipped so one bad subtree
//! never aborts the walk.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Default directory recursion bound, scan root = depth 0.
pub const DEFAULT_MAX_DEPTH: usize = 4;

const MANIFEST_NAME: &str = "package.json";

/// Finds every manifest within `max_depth` directory levels of `root`.
///
/// The returned paths are absolute (when `root` is) and in a
/// deterministic order for a fixed filesystem snapshot.
pub fn find_manifests(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut manifests = Vec::new();

    // Directories are bounded at max_depth, so their files sit one level
    // deeper in walkdir terms.
    let walker = WalkDir::new(root)
        .max_depth(max_depth + 1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(should_descend);

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!("skipping unreadable directory entry: {err}");
                continue;
            }
        };

        if entry.file_type().is_file() && entry.file_name() == MANIFEST_NAME {
            manifests.push(entry.into_path());
        }
    }

    manifests
}

fn should_descend(entry: &DirEntry) -> bool {
    // The root itself is always visited, even a dot-directory.
    if entry.depth() == 0 {
        return true;
    }

    if !entry.file_type().is_dir() {
        return true;
    }

    let name = entry.file_name().to_string_lossy();
    name != "node_modules" && !name.starts_with('.')
}
