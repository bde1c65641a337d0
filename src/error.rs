//! Error types for scanning and manifest handling.
//!
//! The split mirrors how failures propagate: [`ScanError`] is fatal for a
//! whole scan (only root validation can raise it), while [`ManifestError`]
//! is recoverable per project — the orchestrator logs it and reports the
//! project without manifest-derived fields. Probe failures are not errors
//! at all; they degrade individual fields to `None`.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal scan-level errors.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("failed to resolve {path}: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Per-project manifest failures.
///
/// `Parse` (present but malformed) is deliberately distinct from `Io`
/// (missing or unreadable) so callers can tell a broken project apart
/// from a race-deleted one.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a valid package manifest: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
