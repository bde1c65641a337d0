use semver::Version;

/// Dependency names the scanner tracks.
pub const NEXT: &str = "next";
pub const REACT: &str = "react";
pub const TYPES_REACT: &str = "@types/react";
pub const TYPES_REACT_DOM: &str = "@types/react-dom";

pub const TRACKED_DEPENDENCIES: [&str; 4] = [NEXT, REACT, TYPES_REACT, TYPES_REACT_DOM];

/// One patched release line: versions on this line below `fixed_in` are
/// vulnerable, `fixed_in` itself is the proposed replacement.
///
/// A line matches on major version, or on major+minor when `minor` is
/// set (react ships fixes per minor line, next per major line).
#[derive(Debug, Clone)]
pub struct PatchLine {
    pub major: u64,
    pub minor: Option<u64>,
    pub fixed_in: Version,
}

impl PatchLine {
    fn per_major(major: u64, fixed_in: Version) -> Self {
        Self {
            major,
            minor: None,
            fixed_in,
        }
    }

    fn per_minor(major: u64, minor: u64, fixed_in: Version) -> Self {
        Self {
            major,
            minor: Some(minor),
            fixed_in,
        }
    }

    pub fn matches(&self, version: &Version) -> bool {
        version.major == self.major && self.minor.is_none_or(|m| version.minor == m)
    }
}

/// Declarative vulnerability rule for one tracked dependency.
#[derive(Debug, Clone)]
pub struct VulnRule {
    pub name: &'static str,
    /// Advisory identifiers this rule remediates.
    pub advisories: &'static [&'static str],
    /// Patched release lines, ascending.
    pub lines: Vec<PatchLine>,
    /// Replacement proposed for versions predating every patched line.
    /// Those releases are end-of-life, so the recommended stable line is
    /// the only upgrade path.
    pub fallback: Version,
    /// Type-definition packages carry no runtime code and are never
    /// flagged; they are tracked for display and ride along on installs.
    pub types_only: bool,
}

impl VulnRule {
    fn types_only(name: &'static str) -> Self {
        Self {
            name,
            advisories: &[],
            lines: Vec::new(),
            fallback: Version::new(0, 0, 0),
            types_only: true,
        }
    }

    /// Lower bound of the oldest patched line.
    pub fn floor(&self) -> Option<Version> {
        self.lines
            .first()
            .map(|line| Version::new(line.major, line.minor.unwrap_or(0), 0))
    }
}

/// The rule table for the December 2025 React Server Components RCE
/// advisories. Extending the tracked set is one more entry here.
pub fn tracked_rules() -> Vec<VulnRule> {
    vec![
        VulnRule {
            name: NEXT,
            advisories: &["CVE-2025-66478"],
            lines: vec![
                PatchLine::per_major(13, Version::new(13, 5, 12)),
                PatchLine::per_major(14, Version::new(14, 2, 35)),
                PatchLine::per_major(15, Version::new(15, 5, 7)),
                PatchLine::per_major(16, Version::new(16, 0, 7)),
            ],
            fallback: Version::new(15, 5, 7),
            types_only: false,
        },
        VulnRule {
            name: REACT,
            advisories: &["CVE-2025-55182"],
            lines: vec![
                PatchLine::per_minor(19, 0, Version::new(19, 0, 1)),
                PatchLine::per_minor(19, 1, Version::new(19, 1, 2)),
                PatchLine::per_minor(19, 2, Version::new(19, 2, 1)),
            ],
            fallback: Version::new(19, 2, 1),
            types_only: false,
        },
        VulnRule::types_only(TYPES_REACT),
        VulnRule::types_only(TYPES_REACT_DOM),
    ]
}
