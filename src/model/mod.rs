//! Core data types for discovered projects and scan results.
//!
//! This module contains the fundamental types used throughout nextsweep:
//!
//! - [`ProjectStatus`] - A discovered project and everything learned about it
//! - [`GitStatus`] - Best-effort git state, every field independently optional
//! - [`DependencyStatus`] - Classification of one tracked dependency
//! - [`VersionSpec`] - A declared constraint split into prefix and version
//! - [`PackageManager`] - Lockfile-detected package manager
//! - [`ScanReport`] - Complete scan results
//!
//! # Example
//!
//! ```
//! use nextsweep::model::{ScanReport, VersionSpec};
//!
//! let spec = VersionSpec::parse("^15.2.0");
//! assert_eq!(spec.prefix.as_str(), "^");
//!
//! let report = ScanReport::new("/home/dev/projects".into(), vec![]);
//! assert_eq!(report.vulnerable_count(), 0);
//! ```

mod project;
mod version;

pub use project::*;
pub use version::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of one complete scan pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Resolved absolute scan root.
    pub root: PathBuf,
    pub scan_time: DateTime<Utc>,
    /// One entry per discovered manifest, ordered by manifest path.
    pub projects: Vec<ProjectStatus>,
}

impl ScanReport {
    pub fn new(root: PathBuf, projects: Vec<ProjectStatus>) -> Self {
        Self {
            root,
            scan_time: Utc::now(),
            projects,
        }
    }

    pub fn vulnerable_count(&self) -> usize {
        self.projects.iter().filter(|p| p.is_vulnerable()).count()
    }
}
