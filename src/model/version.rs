use semver::Version;
use serde::{Deserialize, Serialize};

/// Range prefix of a declared version spec.
///
/// Only the three styles that appear in practice for pinned app
/// dependencies are recognized; anything more exotic (`>=`, `||` ranges,
/// workspace protocols) leaves the concrete version unparsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangePrefix {
    Caret,
    Tilde,
    Exact,
}

impl RangePrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            RangePrefix::Caret => "^",
            RangePrefix::Tilde => "~",
            RangePrefix::Exact => "",
        }
    }
}

/// A declared dependency version constraint, split into its range prefix
/// and concrete version so remediation can swap the version while keeping
/// the author's range style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSpec {
    /// The spec exactly as written in the manifest.
    pub raw: String,
    pub prefix: RangePrefix,
    /// Parsed concrete version; `None` when the spec has no single
    /// concrete version (`latest`, `workspace:*`, compound ranges).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
}

impl VersionSpec {
    /// Parses a spec string, never failing: an unrecognizable concrete
    /// part just yields `version: None`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let (prefix, rest) = match trimmed.strip_prefix('^') {
            Some(rest) => (RangePrefix::Caret, rest),
            None => match trimmed.strip_prefix('~') {
                Some(rest) => (RangePrefix::Tilde, rest),
                None => (RangePrefix::Exact, trimmed),
            },
        };

        Self {
            raw: raw.to_string(),
            prefix,
            version: parse_lenient(rest.trim()),
        }
    }

    /// Renders this spec with its version replaced, keeping the prefix.
    pub fn with_version(&self, version: &Version) -> String {
        format!("{}{}", self.prefix.as_str(), version)
    }
}

impl std::fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Parses a concrete version, padding `18` / `18.2` style shorthands out
/// to a full triple the way npm treats them.
fn parse_lenient(s: &str) -> Option<Version> {
    if s.is_empty() {
        return None;
    }

    if let Ok(version) = Version::parse(s) {
        return Some(version);
    }

    // Shorthand like "18" or "18.2": numeric components only.
    let parts: Vec<&str> = s.split('.').collect();
    if parts.len() > 2 || parts.iter().any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit())) {
        return None;
    }

    let padded = match parts.as_slice() {
        [major] => format!("{major}.0.0"),
        [major, minor] => format!("{major}.{minor}.0"),
        _ => return None,
    };

    Version::parse(&padded).ok()
}
