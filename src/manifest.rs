//! Typed reading of project manifests (package.json).
//!
//! Decoding is a strict, typed step: malformed JSON surfaces as
//! [`ManifestError::Parse`] instead of degrading into a silently empty
//! document, and the orchestrator decides what to do with it (skip the
//! project's manifest-derived fields, keep scanning).

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::ManifestError;
use crate::model::VersionSpec;
use crate::policy::TRACKED_DEPENDENCIES;

/// The two sections a tracked dependency can be declared in.
#[derive(Debug, Default, Deserialize)]
struct PackageManifest {
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "devDependencies")]
    dev_dependencies: BTreeMap<String, String>,
}

/// Reads the manifest and extracts version specs for the tracked
/// dependency set. A name present in both sections resolves to the
/// runtime entry.
pub async fn read_manifest(
    path: &Path,
) -> Result<BTreeMap<String, VersionSpec>, ManifestError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let manifest: PackageManifest =
        serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(tracked_specs(&manifest))
}

fn tracked_specs(manifest: &PackageManifest) -> BTreeMap<String, VersionSpec> {
    let mut specs = BTreeMap::new();

    for name in TRACKED_DEPENDENCIES {
        let declared = manifest
            .dependencies
            .get(name)
            .or_else(|| manifest.dev_dependencies.get(name));

        if let Some(raw) = declared {
            specs.insert(name.to_string(), VersionSpec::parse(raw));
        }
    }

    specs
}
