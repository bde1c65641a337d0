use std::path::Path;

use anyhow::Result;
use tokio::process::Command;
use tracing::info;

use super::ActionOutcome;
use crate::model::ProjectStatus;

/// Commit message used for every remediation commit.
pub const COMMIT_MESSAGE: &str =
    "Upgrade next and react to mitigate CVE-2025-55182 and CVE-2025-66478";

/// Which resolved branch a checkout targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchTarget {
    Default,
    Production,
}

/// Stages everything, commits with [`COMMIT_MESSAGE`] and pushes. The
/// first failing step aborts the rest.
pub async fn commit_and_push(status: &ProjectStatus) -> ActionOutcome {
    let dir = status.dir();

    let result = async {
        git(&dir, &["add", "-A"]).await?;
        git(&dir, &["commit", "-m", COMMIT_MESSAGE]).await?;
        git(&dir, &["push"]).await?;
        Ok::<_, anyhow::Error>(())
    }
    .await;

    match result {
        Ok(()) => {
            info!(project = %status.display_path, "committed and pushed");
            ActionOutcome::ok("Committed and pushed")
        }
        Err(err) => ActionOutcome::failed(format!("{err:#}")),
    }
}

/// Checks out the project's resolved default or production branch and
/// pulls. When the branch only exists on the remote, a local tracking
/// branch is created first.
pub async fn checkout_branch(status: &ProjectStatus, target: BranchTarget) -> ActionOutcome {
    let branch = match target {
        BranchTarget::Default => status.git.default_branch.as_deref(),
        BranchTarget::Production => status.git.production_branch.as_deref(),
    };
    let Some(branch) = branch else {
        return ActionOutcome::failed(match target {
            BranchTarget::Default => "No default branch detected",
            BranchTarget::Production => "No production branch detected",
        });
    };

    let dir = status.dir();
    let result = async {
        if git(&dir, &["rev-parse", "--verify", "--quiet", branch])
            .await
            .is_ok()
        {
            git(&dir, &["checkout", branch]).await?;
        } else {
            let remote = format!("origin/{branch}");
            git(&dir, &["checkout", "-b", branch, &remote]).await?;
        }
        git(&dir, &["pull"]).await?;
        Ok::<_, anyhow::Error>(())
    }
    .await;

    match result {
        Ok(()) => ActionOutcome::ok(format!("Checked out {branch} and pulled")),
        Err(err) => ActionOutcome::failed(format!("{err:#}")),
    }
}

/// Runs one git command, surfacing stderr as the error message so the
/// outcome shown to the user says what git said.
async fn git(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .await
        .map_err(|err| anyhow::anyhow!("failed to run git {}: {err}", args.join(" ")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "git {} failed: {}",
            args.join(" "),
            stderr.trim().lines().last().unwrap_or("unknown error")
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
