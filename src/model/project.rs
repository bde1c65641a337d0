use std::collections::BTreeMap;
use std::path::PathBuf;

use semver::Version;
use serde::{Deserialize, Serialize};

use super::version::VersionSpec;

/// Package manager owning a project, detected from its lockfile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Npm,
    Yarn,
    Pnpm,
    Bun,
    Unknown,
}

impl PackageManager {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Yarn => "yarn",
            PackageManager::Pnpm => "pnpm",
            PackageManager::Bun => "bun",
            PackageManager::Unknown => "unknown",
        }
    }

    /// Program used to install dependencies. Unknown falls back to npm,
    /// the most common manager.
    pub fn install_program(&self) -> &'static str {
        match self {
            PackageManager::Yarn => "yarn",
            PackageManager::Pnpm => "pnpm",
            PackageManager::Bun => "bun",
            PackageManager::Npm | PackageManager::Unknown => "npm",
        }
    }
}

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Best-effort git state of one project directory.
///
/// Every field is independently optional: `None` always means the
/// sub-query could not be answered, never "zero". A clean working tree is
/// `uncommitted_files: Some(0)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_branch: Option<String>,
    /// Resolved local default branch, "main" or "master".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commits_behind_default: Option<u64>,
    /// Remote production branch, "production" or "prod".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub production_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commits_behind_production: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uncommitted_files: Option<u64>,
}

impl GitStatus {
    /// Status with every sub-query unanswered, e.g. for a directory
    /// without git metadata.
    pub fn unknown() -> Self {
        Self::default()
    }
}

/// Classification of one tracked dependency as declared by a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyStatus {
    pub declared: VersionSpec,
    pub vulnerable: bool,
    /// Proposed replacement; present exactly when `vulnerable`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safe_version: Option<Version>,
}

/// Everything the scan learned about one discovered project.
///
/// Identity is the absolute manifest path. Instances are assembled once
/// per scan pass and never mutated; a re-scan supersedes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectStatus {
    pub manifest_path: PathBuf,
    /// Manifest path relative to the scan root, for display.
    pub display_path: String,
    pub git: GitStatus,
    pub package_manager: PackageManager,
    /// Tracked dependencies actually declared by the manifest. A
    /// dependency the project does not declare has no entry here.
    pub dependencies: BTreeMap<String, DependencyStatus>,
}

impl ProjectStatus {
    /// Directory containing the manifest.
    pub fn dir(&self) -> PathBuf {
        self.manifest_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| self.manifest_path.clone())
    }

    pub fn dependency(&self, name: &str) -> Option<&DependencyStatus> {
        self.dependencies.get(name)
    }

    /// True if any tracked dependency is classified vulnerable.
    pub fn is_vulnerable(&self) -> bool {
        self.dependencies.values().any(|d| d.vulnerable)
    }
}
