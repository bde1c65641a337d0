use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::process::Command;
use tracing::info;

use super::ActionOutcome;
use crate::model::{ProjectStatus, VersionSpec};
use crate::policy::REACT;

/// Sections of the manifest a dependency entry can live in.
const SECTIONS: [&str; 2] = ["dependencies", "devDependencies"];

/// Rewrites the project's manifest so every vulnerable tracked
/// dependency points at its proposed safe version, then reinstalls with
/// the detected package manager. Reports "No changes needed" when
/// nothing was vulnerable.
pub async fn upgrade_project(status: &ProjectStatus) -> ActionOutcome {
    match try_upgrade(status).await {
        Ok(message) => ActionOutcome::ok(message),
        Err(err) => ActionOutcome::failed(format!("{err:#}")),
    }
}

async fn try_upgrade(status: &ProjectStatus) -> Result<String> {
    let content = tokio::fs::read_to_string(&status.manifest_path)
        .await
        .with_context(|| format!("failed to read {}", status.manifest_path.display()))?;
    let mut manifest: Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", status.manifest_path.display()))?;

    if !rewrite_manifest(&mut manifest, status) {
        return Ok("No changes needed".to_string());
    }

    // Same shape the package managers write: two-space indent, trailing
    // newline.
    let rendered = serde_json::to_string_pretty(&manifest)? + "\n";
    tokio::fs::write(&status.manifest_path, rendered)
        .await
        .with_context(|| format!("failed to write {}", status.manifest_path.display()))?;

    let program = status.package_manager.install_program();
    info!(
        project = %status.display_path,
        program,
        "manifest rewritten, installing"
    );
    run_install(&status.dir(), program).await?;

    Ok(format!("Upgraded and installed with {program}"))
}

/// Applies the proposed safe versions to the parsed manifest, preserving
/// each entry's own range prefix. Returns whether anything changed.
///
/// `react-dom` rides along with react: it is versioned in lockstep
/// upstream, so leaving it behind would break the install.
fn rewrite_manifest(manifest: &mut Value, status: &ProjectStatus) -> bool {
    let mut changed = false;

    for (name, dep) in &status.dependencies {
        let Some(safe) = dep.safe_version.as_ref().filter(|_| dep.vulnerable) else {
            continue;
        };

        for section in SECTIONS {
            changed |= set_entry(manifest, section, name, safe);
            if name == REACT {
                set_entry(manifest, section, "react-dom", safe);
            }
        }
    }

    changed
}

/// Points one entry at `safe`, keeping the prefix it was declared with.
/// Entries the manifest does not contain are left alone.
fn set_entry(manifest: &mut Value, section: &str, name: &str, safe: &semver::Version) -> bool {
    let Some(entry) = manifest
        .get_mut(section)
        .and_then(Value::as_object_mut)
        .and_then(|deps| deps.get_mut(name))
    else {
        return false;
    };

    let current = entry.as_str().unwrap_or_default();
    let updated = VersionSpec::parse(current).with_version(safe);
    if current == updated {
        return false;
    }

    *entry = Value::String(updated);
    true
}

async fn run_install(dir: &Path, program: &str) -> Result<()> {
    let output = Command::new(program)
        .arg("install")
        .current_dir(dir)
        .output()
        .await
        .with_context(|| format!("failed to run {program} install"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "{program} install failed: {}",
            stderr.lines().last().unwrap_or("unknown error")
        );
    }

    Ok(())
}
