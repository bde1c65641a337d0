//! Scan orchestration: discovery, concurrent per-project probing, and
//! assembly of [`ProjectStatus`] records.
//!
//! Each project is an independent unit of work; units fan out under a
//! semaphore so a tree full of projects cannot exhaust process limits
//! with spawned git queries. A unit never fails the batch — manifest
//! errors and probe failures degrade that one project's fields. The only
//! fatal error is an unresolvable scan root.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::discovery::{self, DEFAULT_MAX_DEPTH};
use crate::error::ScanError;
use crate::manifest;
use crate::model::{ProjectStatus, ScanReport};
use crate::policy::RuleSet;
use crate::probe;

/// Knobs for one scan pass.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Directory recursion bound, root = 0.
    pub max_depth: usize,
    /// Concurrent per-project probe units.
    pub concurrency: usize,
    /// Whether probes may fetch from remotes before counting commits.
    pub fetch: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            concurrency: 8,
            fetch: true,
        }
    }
}

/// Scans `root` and returns one status record per discovered manifest,
/// ordered by manifest path.
///
/// # Errors
///
/// Only root validation fails the scan: a root that does not exist (or
/// cannot be resolved) returns [`ScanError`]. Everything below that
/// degrades per project, per field.
pub async fn scan(root: impl AsRef<Path>, options: &ScanOptions) -> Result<ScanReport, ScanError> {
    let root = resolve_root(root.as_ref()).await?;

    let manifests = discovery::find_manifests(&root, options.max_depth);
    info!(
        root = %root.display(),
        manifests = manifests.len(),
        "starting scan"
    );

    let rules = Arc::new(RuleSet::default());
    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));

    let units = manifests.into_iter().map(|manifest_path| {
        let root = root.clone();
        let rules = Arc::clone(&rules);
        let semaphore = Arc::clone(&semaphore);
        let fetch = options.fetch;

        async move {
            let _permit = semaphore.acquire_owned().await.ok();
            inspect_project(&root, manifest_path, &rules, fetch).await
        }
    });

    let mut projects: Vec<ProjectStatus> = join_all(units).await;
    projects.sort_by(|a, b| a.manifest_path.cmp(&b.manifest_path));

    Ok(ScanReport::new(root, projects))
}

/// Inspects a single project directory, e.g. before a remediation
/// action. The directory must directly contain a manifest.
pub async fn inspect(dir: impl AsRef<Path>) -> Result<Option<ProjectStatus>, ScanError> {
    let dir = resolve_root(dir.as_ref()).await?;
    let manifest_path = dir.join("package.json");
    if !manifest_path.is_file() {
        return Ok(None);
    }

    let rules = RuleSet::default();
    Ok(Some(inspect_project(&dir, manifest_path, &rules, true).await))
}

async fn resolve_root(root: &Path) -> Result<PathBuf, ScanError> {
    tokio::fs::canonicalize(root).await.map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ScanError::PathNotFound(root.to_path_buf())
        } else {
            ScanError::RootUnreadable {
                path: root.to_path_buf(),
                source,
            }
        }
    })
}

/// Probes one manifest's project and reduces the typed outcomes into a
/// status record. Infallible by design: failures leave fields unknown.
async fn inspect_project(
    root: &Path,
    manifest_path: PathBuf,
    rules: &RuleSet,
    fetch: bool,
) -> ProjectStatus {
    let dir = manifest_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());

    let (declared, git, package_manager) = tokio::join!(
        manifest::read_manifest(&manifest_path),
        probe::probe_git(&dir, fetch),
        probe::detect_package_manager(&dir),
    );

    let declared = match declared {
        Ok(declared) => declared,
        Err(err) => {
            warn!(manifest = %manifest_path.display(), "skipping manifest contents: {err}");
            BTreeMap::new()
        }
    };

    let dependencies = rules.classify_project(&declared);
    debug!(
        manifest = %manifest_path.display(),
        tracked = dependencies.len(),
        vulnerable = dependencies.values().filter(|d| d.vulnerable).count(),
        "project inspected"
    );

    ProjectStatus {
        display_path: display_path(root, &manifest_path),
        manifest_path,
        git,
        package_manager,
        dependencies,
    }
}

fn display_path(root: &Path, manifest_path: &Path) -> String {
    manifest_path
        .strip_prefix(root)
        .unwrap_or(manifest_path)
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PackageManager;
    use std::fs;
    use tempfile::TempDir;

    fn write_project(root: &Path, rel: &str, manifest: &str, lockfile: Option<&str>) {
        let dir = root.join(rel);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("package.json"), manifest).unwrap();
        if let Some(lockfile) = lockfile {
            fs::write(dir.join(lockfile), "").unwrap();
        }
    }

    fn options() -> ScanOptions {
        ScanOptions {
            fetch: false,
            ..ScanOptions::default()
        }
    }

    #[tokio::test]
    async fn test_missing_root_is_single_error() {
        let err = scan("/definitely/not/a/path", &options()).await.unwrap_err();
        assert!(matches!(err, ScanError::PathNotFound(_)));
    }

    #[tokio::test]
    async fn test_scan_classifies_and_sorts_projects() {
        let tmp = TempDir::new().unwrap();
        write_project(
            tmp.path(),
            "b-unsafe",
            r#"{ "dependencies": { "next": "15.0.0", "react": "18.0.0" } }"#,
            Some("pnpm-lock.yaml"),
        );
        write_project(
            tmp.path(),
            "a-safe",
            r#"{ "dependencies": { "next": "^15.5.7", "react": "18.0.0" } }"#,
            None,
        );

        let report = scan(tmp.path(), &options()).await.unwrap();
        assert_eq!(report.projects.len(), 2);
        assert_eq!(report.vulnerable_count(), 1);

        // Sorted by manifest path, not discovery order.
        let [safe, unsafe_] = &report.projects[..] else {
            panic!("expected two projects");
        };
        assert!(safe.display_path.starts_with("a-safe"));
        assert!(!safe.is_vulnerable());
        assert!(!safe.dependency("react").unwrap().vulnerable);

        assert!(unsafe_.is_vulnerable());
        assert!(unsafe_.dependency("next").unwrap().vulnerable);
        assert!(unsafe_.dependency("react").unwrap().vulnerable);
        assert_eq!(unsafe_.package_manager, PackageManager::Pnpm);
    }

    #[tokio::test]
    async fn test_no_git_metadata_degrades_to_unknown() {
        let tmp = TempDir::new().unwrap();
        write_project(
            tmp.path(),
            "plain",
            r#"{ "dependencies": { "next": "15.0.0" } }"#,
            None,
        );

        let report = scan(tmp.path(), &options()).await.unwrap();
        let project = &report.projects[0];

        // Manifest-derived fields still populated.
        assert!(project.dependency("next").unwrap().vulnerable);
        // Every git sub-query degraded independently to unknown.
        assert_eq!(project.git.current_branch, None);
        assert_eq!(project.git.default_branch, None);
        assert_eq!(project.git.commits_behind_default, None);
    }

    #[tokio::test]
    async fn test_malformed_manifest_skips_only_that_project() {
        let tmp = TempDir::new().unwrap();
        write_project(tmp.path(), "broken", "{ not json", Some("yarn.lock"));
        write_project(
            tmp.path(),
            "fine",
            r#"{ "dependencies": { "next": "16.0.7" } }"#,
            None,
        );

        let report = scan(tmp.path(), &options()).await.unwrap();
        assert_eq!(report.projects.len(), 2);

        let broken = &report.projects[0];
        assert!(broken.dependencies.is_empty());
        assert!(!broken.is_vulnerable());
        // Non-manifest probes still reported.
        assert_eq!(broken.package_manager, PackageManager::Yarn);

        assert!(report.projects[1].dependency("next").is_some());
    }

    #[tokio::test]
    async fn test_inspect_single_project() {
        let tmp = TempDir::new().unwrap();
        write_project(
            tmp.path(),
            "",
            r#"{ "dependencies": { "next": "14.0.0" } }"#,
            None,
        );

        let status = inspect(tmp.path()).await.unwrap().unwrap();
        assert!(status.is_vulnerable());

        let empty = TempDir::new().unwrap();
        assert!(inspect(empty.path()).await.unwrap().is_none());
    }
}
