//! Dependency-set comparison between a project and a shared store.
//!
//! A shared `node_modules` tree can hold exactly one version of any package,
//! so two projects may only share one when every dependency the linking
//! project declares is present in the store owner's manifest at the exact
//! same version string. No semver range arithmetic; a range that merely
//! overlaps is still a mismatch.

use std::collections::BTreeMap;
use std::fmt;

/// A version conflict for one package name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// Version the linking project declares.
    pub required: String,

    /// Version the shared-store owner declares.
    pub available: String,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs {}", self.required, self.available)
    }
}

/// Result of comparing a project's dependency set against a shared store's.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyComparison {
    /// Packages the project needs that the store owner does not declare.
    pub missing: BTreeMap<String, String>,

    /// Packages declared by both, at different version strings.
    pub mismatched: BTreeMap<String, Mismatch>,
}

impl DependencyComparison {
    /// True when the store cannot safely be shared.
    pub fn has_problem(&self) -> bool {
        !self.missing.is_empty() || !self.mismatched.is_empty()
    }

    /// One line per conflicting entry, for diagnostics.
    pub fn report_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (name, version) in &self.missing {
            lines.push(format!("missing: {name} {version}"));
        }
        for (name, mismatch) in &self.mismatched {
            lines.push(format!("mismatched: {name} {mismatch}"));
        }
        lines
    }
}

/// Compare a project's (already merged) dependency map against a shared
/// store owner's.
///
/// A project with no dependencies trivially satisfies any store.
pub fn compare(
    project: &BTreeMap<String, String>,
    shared: &BTreeMap<String, String>,
) -> DependencyComparison {
    let mut result = DependencyComparison::default();

    for (name, required) in project {
        match shared.get(name) {
            None => {
                result.missing.insert(name.clone(), required.clone());
            }
            Some(available) if available != required => {
                result.mismatched.insert(
                    name.clone(),
                    Mismatch {
                        required: required.clone(),
                        available: available.clone(),
                    },
                );
            }
            Some(_) => {}
        }
    }

    result
}
