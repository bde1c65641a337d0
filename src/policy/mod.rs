//! Vulnerability classification policy.
//!
//! Pure functions over the declarative rule table in [`rules`]: no I/O,
//! no state. The range prefix of a spec (`^`, `~`, none) never affects
//! classification, only remediation.
//!
//! # The conditional react rule
//!
//! react is only ever *reported* vulnerable while next is vulnerable,
//! regardless of react's own version. This is deliberate, not a bug: the
//! patched react-server-dom packages ship as a side effect of the next
//! upgrade, so a project on a patched next is already protected and has
//! no standalone react remediation path. The gate is evaluated
//! framework-first in [`RuleSet::classify_project`].

pub mod rules;

pub use rules::{tracked_rules, VulnRule, NEXT, REACT, TRACKED_DEPENDENCIES};

use std::collections::BTreeMap;

use semver::Version;
use tracing::debug;

use crate::model::{DependencyStatus, VersionSpec};

/// Outcome of classifying one version spec against one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub vulnerable: bool,
    pub safe_version: Option<Version>,
}

impl Classification {
    fn safe() -> Self {
        Self {
            vulnerable: false,
            safe_version: None,
        }
    }

    fn vulnerable(safe_version: Version) -> Self {
        Self {
            vulnerable: true,
            safe_version: Some(safe_version),
        }
    }
}

/// The loaded rule table.
pub struct RuleSet {
    rules: Vec<VulnRule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            rules: tracked_rules(),
        }
    }
}

impl RuleSet {
    pub fn rule(&self, name: &str) -> Option<&VulnRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn is_tracked(&self, name: &str) -> bool {
        self.rule(name).is_some()
    }

    /// Classifies a single dependency in isolation, without the
    /// cross-dependency gate.
    pub fn classify(&self, name: &str, spec: &VersionSpec) -> Classification {
        let Some(rule) = self.rule(name) else {
            return Classification::safe();
        };
        classify_spec(rule, spec)
    }

    /// Classifies every declared tracked dependency of one project,
    /// applying the framework-first react gate.
    pub fn classify_project(
        &self,
        declared: &BTreeMap<String, VersionSpec>,
    ) -> BTreeMap<String, DependencyStatus> {
        // next first: its verdict gates react's.
        let next_vulnerable = declared
            .get(NEXT)
            .map(|spec| self.classify(NEXT, spec).vulnerable)
            .unwrap_or(false);

        declared
            .iter()
            .map(|(name, spec)| {
                let mut classification = self.classify(name, spec);
                if name == REACT && !next_vulnerable {
                    // Patched (or absent) next already protects react.
                    classification = Classification::safe();
                }
                (
                    name.clone(),
                    DependencyStatus {
                        declared: spec.clone(),
                        vulnerable: classification.vulnerable,
                        safe_version: classification.safe_version,
                    },
                )
            })
            .collect()
    }
}

fn classify_spec(rule: &VulnRule, spec: &VersionSpec) -> Classification {
    if rule.types_only {
        return Classification::safe();
    }

    let Some(version) = &spec.version else {
        // No concrete version to compare; flagging would propose a
        // rewrite we cannot justify.
        debug!(dependency = rule.name, spec = %spec.raw, "version spec not comparable, treating as safe");
        return Classification::safe();
    };

    for line in &rule.lines {
        if line.matches(version) {
            if *version < line.fixed_in {
                return Classification::vulnerable(line.fixed_in.clone());
            }
            return Classification::safe();
        }
    }

    // Older than every patched line: upgrade to the recommended line.
    // Newer lines without a rule entry are presumed patched.
    if let Some(floor) = rule.floor() {
        if *version < floor {
            return Classification::vulnerable(rule.fallback.clone());
        }
    }

    Classification::safe()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::rules::{TYPES_REACT, TYPES_REACT_DOM};

    fn declared(entries: &[(&str, &str)]) -> BTreeMap<String, VersionSpec> {
        entries
            .iter()
            .map(|(name, spec)| (name.to_string(), VersionSpec::parse(spec)))
            .collect()
    }

    #[test]
    fn test_prefix_does_not_affect_classification() {
        let rules = RuleSet::default();

        for spec in ["15.0.0", "^15.0.0", "~15.0.0"] {
            let c = rules.classify(NEXT, &VersionSpec::parse(spec));
            assert!(c.vulnerable, "{spec} should be vulnerable");
            assert_eq!(c.safe_version, Some(Version::new(15, 5, 7)));
        }

        for spec in ["15.5.7", "^15.5.7", "~15.5.7"] {
            let c = rules.classify(NEXT, &VersionSpec::parse(spec));
            assert!(!c.vulnerable, "{spec} should be safe");
        }
    }

    #[test]
    fn test_next_patch_lines() {
        let rules = RuleSet::default();

        let cases = [
            ("13.4.0", true, Some(Version::new(13, 5, 12))),
            ("13.5.12", false, None),
            ("14.2.0", true, Some(Version::new(14, 2, 35))),
            ("14.2.35", false, None),
            ("15.5.6", true, Some(Version::new(15, 5, 7))),
            ("16.0.0", true, Some(Version::new(16, 0, 7))),
            ("16.0.7", false, None),
            // Newer than every known line: presumed patched.
            ("17.0.0", false, None),
        ];

        for (spec, vulnerable, safe) in cases {
            let c = rules.classify(NEXT, &VersionSpec::parse(spec));
            assert_eq!(c.vulnerable, vulnerable, "next {spec}");
            assert_eq!(c.safe_version, safe, "next {spec}");
        }
    }

    #[test]
    fn test_versions_below_every_line_use_fallback() {
        let rules = RuleSet::default();

        let c = rules.classify(NEXT, &VersionSpec::parse("5.0.0"));
        assert!(c.vulnerable);
        assert_eq!(c.safe_version, Some(Version::new(15, 5, 7)));

        let c = rules.classify(REACT, &VersionSpec::parse("18.0.0"));
        assert!(c.vulnerable);
        assert_eq!(c.safe_version, Some(Version::new(19, 2, 1)));
    }

    #[test]
    fn test_react_minor_lines() {
        let rules = RuleSet::default();

        let c = rules.classify(REACT, &VersionSpec::parse("19.1.0"));
        assert!(c.vulnerable);
        assert_eq!(c.safe_version, Some(Version::new(19, 1, 2)));

        assert!(!rules.classify(REACT, &VersionSpec::parse("19.1.2")).vulnerable);
        assert!(!rules.classify(REACT, &VersionSpec::parse("19.3.0")).vulnerable);
    }

    #[test]
    fn test_types_packages_never_flagged() {
        let rules = RuleSet::default();

        for name in [TYPES_REACT, TYPES_REACT_DOM] {
            let c = rules.classify(name, &VersionSpec::parse("0.0.1"));
            assert!(!c.vulnerable);
            assert_eq!(c.safe_version, None);
        }
    }

    #[test]
    fn test_uncomparable_spec_is_safe() {
        let rules = RuleSet::default();
        assert!(!rules.classify(NEXT, &VersionSpec::parse("latest")).vulnerable);
        assert!(!rules.classify(NEXT, &VersionSpec::parse("workspace:*")).vulnerable);
    }

    #[test]
    fn test_vulnerable_next_exposes_react() {
        let rules = RuleSet::default();
        let statuses =
            rules.classify_project(&declared(&[(NEXT, "5.0.0"), (REACT, "18.0.0")]));

        assert!(statuses[NEXT].vulnerable);
        assert_eq!(statuses[NEXT].safe_version, Some(Version::new(15, 5, 7)));
        assert!(statuses[REACT].vulnerable);
        assert_eq!(statuses[REACT].safe_version, Some(Version::new(19, 2, 1)));
    }

    #[test]
    fn test_patched_next_protects_react() {
        let rules = RuleSet::default();
        let statuses =
            rules.classify_project(&declared(&[(NEXT, "15.5.7"), (REACT, "18.0.0")]));

        assert!(!statuses[NEXT].vulnerable);
        // react 18.0.0 is below its own threshold, yet reported safe.
        assert!(!statuses[REACT].vulnerable);
        assert_eq!(statuses[REACT].safe_version, None);
    }

    #[test]
    fn test_react_without_next_is_safe() {
        let rules = RuleSet::default();
        let statuses = rules.classify_project(&declared(&[(REACT, "18.0.0")]));
        assert!(!statuses[REACT].vulnerable);
    }

    #[test]
    fn test_no_flag_without_declared_version() {
        let rules = RuleSet::default();
        let statuses = rules.classify_project(&declared(&[(NEXT, "13.0.0")]));

        // Only declared dependencies appear; each flagged entry carries
        // its declared spec.
        assert_eq!(statuses.len(), 1);
        for status in statuses.values() {
            if status.vulnerable {
                assert!(!status.declared.raw.is_empty());
                assert!(status.safe_version.is_some());
            }
        }
    }
}
