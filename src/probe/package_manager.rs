use std::path::Path;

use crate::model::PackageManager;

/// Lockfile markers in precedence order; first match wins.
const MARKERS: [(&str, PackageManager); 5] = [
    ("bun.lockb", PackageManager::Bun),
    ("bun.lock", PackageManager::Bun),
    ("pnpm-lock.yaml", PackageManager::Pnpm),
    ("yarn.lock", PackageManager::Yarn),
    ("package-lock.json", PackageManager::Npm),
];

/// Infers the package manager owning a project from the lockfiles in its
/// directory's immediate listing. No markers (or an unreadable
/// directory) yields [`PackageManager::Unknown`].
pub async fn detect_package_manager(dir: &Path) -> PackageManager {
    let mut names = Vec::new();

    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return PackageManager::Unknown;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        names.push(entry.file_name());
    }

    for (marker, manager) in MARKERS {
        if names.iter().any(|name| name == marker) {
            return manager;
        }
    }

    PackageManager::Unknown
}
