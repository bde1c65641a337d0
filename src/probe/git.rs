use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::model::GitStatus;

/// Per-query deadline; a stalled git invocation costs at most this much
/// and degrades only its own sub-query.
const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs one git query in a directory.
///
/// Implemented by [`GitCli`] for real scans; tests substitute a scripted
/// runner so probe logic is exercised without spawning processes.
#[async_trait]
pub trait GitRunner: Send + Sync {
    /// Returns trimmed stdout on success, `None` on any failure: missing
    /// binary, non-zero exit, timeout.
    async fn run(&self, dir: &Path, args: &[&str]) -> Option<String>;
}

/// [`GitRunner`] backed by the `git` binary.
pub struct GitCli {
    timeout: Duration,
}

impl Default for GitCli {
    fn default() -> Self {
        Self {
            timeout: QUERY_TIMEOUT,
        }
    }
}

#[async_trait]
impl GitRunner for GitCli {
    async fn run(&self, dir: &Path, args: &[&str]) -> Option<String> {
        let output = Command::new("git")
            .arg("-C")
            .arg(dir)
            .args(args)
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(self.timeout, output).await {
            Ok(Ok(output)) if output.status.success() => {
                Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
            }
            Ok(_) => None,
            Err(_) => {
                debug!(dir = %dir.display(), ?args, "git query timed out");
                None
            }
        }
    }
}

/// Probes a project directory's git state, best-effort.
///
/// `fetch` controls the remote synchronization step that precedes the
/// behind-counts; it is itself allowed to fail silently (offline, no
/// remote).
pub async fn probe_git(dir: &Path, fetch: bool) -> GitStatus {
    probe_git_with(&GitCli::default(), dir, fetch).await
}

pub async fn probe_git_with(runner: &dyn GitRunner, dir: &Path, fetch: bool) -> GitStatus {
    let (current_branch, uncommitted_files) =
        tokio::join!(current_branch(runner, dir), uncommitted_files(runner, dir));

    if fetch {
        runner.run(dir, &["fetch", "--quiet"]).await;
    }

    let (default, production) = tokio::join!(
        default_branch_info(runner, dir),
        production_branch_info(runner, dir)
    );

    GitStatus {
        current_branch,
        default_branch: default.0,
        commits_behind_default: default.1,
        production_branch: production.0,
        commits_behind_production: production.1,
        uncommitted_files,
    }
}

async fn current_branch(runner: &dyn GitRunner, dir: &Path) -> Option<String> {
    let branch = runner.run(dir, &["rev-parse", "--abbrev-ref", "HEAD"]).await?;
    // Detached HEAD resolves to the literal string "HEAD".
    if branch.is_empty() || branch == "HEAD" {
        return None;
    }
    Some(branch)
}

async fn uncommitted_files(runner: &dyn GitRunner, dir: &Path) -> Option<u64> {
    let status = runner.run(dir, &["status", "--porcelain"]).await?;
    Some(status.lines().filter(|line| !line.trim().is_empty()).count() as u64)
}

async fn branch_exists(runner: &dyn GitRunner, dir: &Path, branch: &str) -> bool {
    runner
        .run(dir, &["rev-parse", "--verify", "--quiet", branch])
        .await
        .is_some()
}

async fn behind_count(runner: &dyn GitRunner, dir: &Path, branch: &str) -> Option<u64> {
    let range = format!("{branch}..origin/{branch}");
    let count = runner.run(dir, &["rev-list", "--count", &range]).await?;
    count.parse().ok()
}

/// Resolves the local default branch (`main`, then `master`) and how far
/// it lags its remote counterpart. No remote tracking ref means the
/// count is unknown, not zero.
async fn default_branch_info(
    runner: &dyn GitRunner,
    dir: &Path,
) -> (Option<String>, Option<u64>) {
    for candidate in ["main", "master"] {
        if branch_exists(runner, dir, candidate).await {
            let behind = behind_count(runner, dir, candidate).await;
            return (Some(candidate.to_string()), behind);
        }
    }
    (None, None)
}

/// Resolves the remote production branch (`origin/production`, then
/// `origin/prod`). The behind-count additionally needs a same-named
/// local branch; without one it stays unknown.
async fn production_branch_info(
    runner: &dyn GitRunner,
    dir: &Path,
) -> (Option<String>, Option<u64>) {
    for candidate in ["production", "prod"] {
        let remote = format!("origin/{candidate}");
        if branch_exists(runner, dir, &remote).await {
            let behind = if branch_exists(runner, dir, candidate).await {
                behind_count(runner, dir, candidate).await
            } else {
                None
            };
            return (Some(candidate.to_string()), behind);
        }
    }
    (None, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Scripted runner: maps joined argument strings to canned stdout.
    /// Anything unscripted fails, like a git query would.
    struct FakeGit {
        responses: HashMap<String, String>,
    }

    impl FakeGit {
        fn new(entries: &[(&str, &str)]) -> Self {
            Self {
                responses: entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl GitRunner for FakeGit {
        async fn run(&self, _dir: &Path, args: &[&str]) -> Option<String> {
            self.responses.get(&args.join(" ")).cloned()
        }
    }

    fn dir() -> &'static Path {
        Path::new("/repo")
    }

    #[tokio::test]
    async fn test_healthy_repository() {
        let git = FakeGit::new(&[
            ("rev-parse --abbrev-ref HEAD", "feature/upgrade"),
            ("status --porcelain", " M src/app.js\n?? notes.txt"),
            ("fetch --quiet", ""),
            ("rev-parse --verify --quiet main", "abc123"),
            ("rev-list --count main..origin/main", "3"),
            ("rev-parse --verify --quiet origin/production", "def456"),
            ("rev-parse --verify --quiet production", "def456"),
            ("rev-list --count production..origin/production", "7"),
        ]);

        let status = probe_git_with(&git, dir(), true).await;
        assert_eq!(status.current_branch.as_deref(), Some("feature/upgrade"));
        assert_eq!(status.uncommitted_files, Some(2));
        assert_eq!(status.default_branch.as_deref(), Some("main"));
        assert_eq!(status.commits_behind_default, Some(3));
        assert_eq!(status.production_branch.as_deref(), Some("production"));
        assert_eq!(status.commits_behind_production, Some(7));
    }

    #[tokio::test]
    async fn test_no_repository_all_unknown() {
        let git = FakeGit::new(&[]);
        let status = probe_git_with(&git, dir(), true).await;
        assert_eq!(status, GitStatus::unknown());
    }

    #[tokio::test]
    async fn test_detached_head_is_unknown_branch() {
        let git = FakeGit::new(&[
            ("rev-parse --abbrev-ref HEAD", "HEAD"),
            ("status --porcelain", ""),
        ]);

        let status = probe_git_with(&git, dir(), false).await;
        assert_eq!(status.current_branch, None);
        // Clean tree is zero, distinguishable from unknown.
        assert_eq!(status.uncommitted_files, Some(0));
    }

    #[tokio::test]
    async fn test_master_fallback_without_tracking_ref() {
        let git = FakeGit::new(&[
            ("rev-parse --abbrev-ref HEAD", "master"),
            ("rev-parse --verify --quiet master", "abc123"),
            // No rev-list response: no remote tracking branch.
        ]);

        let status = probe_git_with(&git, dir(), false).await;
        assert_eq!(status.default_branch.as_deref(), Some("master"));
        assert_eq!(status.commits_behind_default, None);
    }

    #[tokio::test]
    async fn test_remote_prod_without_local_branch() {
        let git = FakeGit::new(&[
            ("rev-parse --verify --quiet origin/prod", "abc123"),
            ("rev-list --count prod..origin/prod", "4"),
        ]);

        let status = probe_git_with(&git, dir(), false).await;
        assert_eq!(status.production_branch.as_deref(), Some("prod"));
        // Local branch missing: count must stay unknown even though the
        // range query would have answered.
        assert_eq!(status.commits_behind_production, None);
    }

    #[tokio::test]
    async fn test_one_failed_query_does_not_blank_others() {
        let git = FakeGit::new(&[
            ("status --porcelain", ""),
            ("rev-parse --verify --quiet main", "abc123"),
            ("rev-list --count main..origin/main", "0"),
        ]);

        let status = probe_git_with(&git, dir(), true).await;
        assert_eq!(status.current_branch, None);
        assert_eq!(status.uncommitted_files, Some(0));
        assert_eq!(status.default_branch.as_deref(), Some("main"));
        assert_eq!(status.commits_behind_default, Some(0));
    }

    #[tokio::test]
    async fn test_unparseable_count_is_unknown() {
        let git = FakeGit::new(&[
            ("rev-parse --verify --quiet main", "abc123"),
            ("rev-list --count main..origin/main", "not a number"),
        ]);

        let status = probe_git_with(&git, dir(), false).await;
        assert_eq!(status.commits_behind_default, None);
    }
}
