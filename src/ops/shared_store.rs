//! Shared `node_modules` store resolution.
//!
//! Two strategies, tried in this order:
//!
//! 1. **Environment variable**: each name in
//!    `sharedNodeModuleProjectSLinkEnvVar` is tried in priority order; the
//!    first one that is set names a sibling project root whose
//!    `node_modules` this project links to.
//! 2. **Sibling search**: walk parent directories upward; at each level try
//!    each name in `sharedNodeModuleProjectSLinks`, running that sibling's
//!    install step once if it has no `node_modules` yet.
//!
//! Either way the store owner's manifest must declare every dependency this
//! project declares, at the identical version string; a shared tree can
//! only hold one version of a package, so divergence is fatal rather than
//! silently mislinked.

use anyhow::{Context, Result};
use thiserror::Error;

use crate::core::compare;
use crate::core::manifest::{PackageManifest, MANIFEST_FILE};
use crate::core::path::PortablePath;
use crate::util::context::GlobalContext;
use crate::util::diagnostic::{suggestions, Diagnostic};
use crate::util::fs::LinkFs;
use crate::util::process::{find_npm, ProcessBuilder};

/// Exit code when a shared-store env var points at a missing path.
pub const EXIT_ENV_TARGET_MISSING: i32 = 1808;
/// Exit code for a version mismatch via the env-var strategy.
pub const EXIT_ENV_VERSION_MISMATCH: i32 = 1870;
/// Exit code for a version mismatch via the sibling search.
pub const EXIT_SIBLING_VERSION_MISMATCH: i32 = 1975;

/// Fatal shared-store failure, each with its own process exit code.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("${var} points at `{target}`, which does not exist")]
    EnvTargetMissing { var: String, target: String },

    #[error("dependency versions diverge from shared store `{store}` (via ${var})")]
    EnvVersionMismatch {
        var: String,
        store: String,
        conflicts: Vec<String>,
    },

    #[error("dependency versions diverge from sibling project `{store}`")]
    SiblingVersionMismatch { store: String, conflicts: Vec<String> },
}

impl StoreError {
    /// The process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            StoreError::EnvTargetMissing { .. } => EXIT_ENV_TARGET_MISSING,
            StoreError::EnvVersionMismatch { .. } => EXIT_ENV_VERSION_MISMATCH,
            StoreError::SiblingVersionMismatch { .. } => EXIT_SIBLING_VERSION_MISMATCH,
        }
    }

    /// Render the failure with its conflicting entries and a fix.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            StoreError::EnvTargetMissing { .. } => {
                Diagnostic::error(self.to_string()).with_suggestion(suggestions::FIX_ENV_TARGET)
            }
            StoreError::EnvVersionMismatch { store, conflicts, .. }
            | StoreError::SiblingVersionMismatch { store, conflicts } => {
                let mut diag = Diagnostic::error(self.to_string())
                    .with_location(format!("{store}/{MANIFEST_FILE}"));
                for line in conflicts {
                    diag = diag.with_context(line.clone());
                }
                diag.with_suggestion(suggestions::ALIGN_VERSIONS)
            }
        }
    }
}

/// What shared-store resolution did for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SharedStoreOutcome {
    /// `node_modules` now links to `store`.
    Linked { store: PortablePath },

    /// The manifest declares no shared-store strategy; `node_modules` was
    /// left untouched.
    NotConfigured,

    /// The sibling search reached the filesystem root without a usable
    /// candidate. Not fatal; the remaining link steps still run.
    NoSiblingFound,
}

/// Resolve and apply the shared-store strategy for this run.
pub fn resolve_shared_store(
    ctx: &GlobalContext,
    fs: &LinkFs,
    manifest: &PackageManifest,
) -> Result<SharedStoreOutcome> {
    for var in manifest.shared_store_env_vars() {
        let value = match std::env::var(var) {
            Ok(value) if !value.is_empty() => value,
            _ => continue,
        };

        tracing::debug!("shared store candidate from ${var}: {value}");
        let root = PortablePath::parse(&value, false)
            .with_context(|| format!("${var} holds an unusable path `{value}`"))?;

        if !fs.exists(&root) {
            return Err(StoreError::EnvTargetMissing {
                var: var.clone(),
                target: root.to_string(),
            }
            .into());
        }

        // The variable points at a project root, so the store is its
        // node_modules (not the root itself).
        ensure_compatible(fs, manifest, &root, |conflicts| StoreError::EnvVersionMismatch {
            var: var.clone(),
            store: root.to_string(),
            conflicts,
        })?;

        let store = root.child("node_modules")?;
        link_node_modules(ctx, fs, &store)?;
        return Ok(SharedStoreOutcome::Linked { store });
    }

    if manifest.shared_store_projects().is_empty() {
        return Ok(SharedStoreOutcome::NotConfigured);
    }

    search_siblings(ctx, fs, manifest)
}

/// Walk parent directories looking for a sibling project with a usable
/// `node_modules`. The first usable candidate wins; reaching the filesystem
/// root without one is a warning, not an error.
fn search_siblings(
    ctx: &GlobalContext,
    fs: &LinkFs,
    manifest: &PackageManifest,
) -> Result<SharedStoreOutcome> {
    let mut level = match ctx.cwd().parent() {
        Ok(parent) => parent,
        Err(_) => return Ok(SharedStoreOutcome::NoSiblingFound),
    };

    loop {
        for name in manifest.shared_store_projects() {
            let sibling = level.child(name)?;
            if !fs.exists(&sibling) {
                continue;
            }

            tracing::debug!("considering sibling `{sibling}`");
            let store = sibling.child("node_modules")?;
            if !fs.exists(&store) {
                install_sibling(fs, &sibling);
            }
            if !fs.exists(&store) {
                tracing::debug!("sibling `{sibling}` has no usable node_modules, moving on");
                continue;
            }

            ensure_compatible(fs, manifest, &sibling, |conflicts| {
                StoreError::SiblingVersionMismatch {
                    store: sibling.to_string(),
                    conflicts,
                }
            })?;

            link_node_modules(ctx, fs, &store)?;
            return Ok(SharedStoreOutcome::Linked { store });
        }

        level = match level.parent() {
            Ok(parent) => parent,
            Err(_) => return Ok(SharedStoreOutcome::NoSiblingFound),
        };
    }
}

/// Compare this project's dependency set against the store owner's
/// manifest; build the strategy-specific error on divergence.
fn ensure_compatible(
    fs: &LinkFs,
    project: &PackageManifest,
    owner_root: &PortablePath,
    on_conflict: impl FnOnce(Vec<String>) -> StoreError,
) -> Result<()> {
    let owner_manifest_path = owner_root.child(MANIFEST_FILE)?;
    let owner: PackageManifest = fs
        .read_json(&owner_manifest_path)
        .with_context(|| format!("shared store owner has no readable {MANIFEST_FILE}"))?;

    let comparison = compare::compare(&project.merged_dependencies(), &owner.merged_dependencies());
    if comparison.has_problem() {
        return Err(on_conflict(comparison.report_lines()).into());
    }
    Ok(())
}

/// Run the sibling's install step, once. Failure is not fatal here; the
/// caller re-probes `node_modules` and moves to the next candidate.
fn install_sibling(fs: &LinkFs, sibling: &PortablePath) {
    let Some(npm) = find_npm() else {
        tracing::warn!("sibling `{sibling}` has no node_modules and npm is not on PATH");
        return;
    };

    tracing::info!("running npm install in `{sibling}`");
    let result = ProcessBuilder::new(npm.to_string_lossy())
        .arg("install")
        .cwd(fs.native(sibling))
        .exec();
    if let Err(error) = result {
        tracing::warn!("npm install in `{sibling}` failed: {error:#}");
    }
}

/// Replace any existing `node_modules` in the working directory with a link
/// to `store`.
fn link_node_modules(ctx: &GlobalContext, fs: &LinkFs, store: &PortablePath) -> Result<()> {
    let node_modules = PortablePath::parse("node_modules", true)?;
    fs.remove(&node_modules, ctx.cwd())?;
    fs.create_symlink("node_modules", store, ctx.cwd())?;
    tracing::info!("linked node_modules -> {store}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let missing = StoreError::EnvTargetMissing {
            var: "SLINK_SHARE".into(),
            target: "/gone".into(),
        };
        assert_eq!(missing.exit_code(), 1808);

        let env_mismatch = StoreError::EnvVersionMismatch {
            var: "SLINK_SHARE".into(),
            store: "/home/dev/shared".into(),
            conflicts: vec![],
        };
        assert_eq!(env_mismatch.exit_code(), 1870);

        let sibling_mismatch = StoreError::SiblingVersionMismatch {
            store: "/home/dev/tests4ts".into(),
            conflicts: vec![],
        };
        assert_eq!(sibling_mismatch.exit_code(), 1975);
    }

    #[test]
    fn test_diagnostic_lists_conflicts() {
        let err = StoreError::SiblingVersionMismatch {
            store: "/home/dev/tests4ts".into(),
            conflicts: vec!["mismatched: x 1.0.0 vs 2.0.0".into()],
        };
        let text = err.to_diagnostic().format(false);
        assert!(text.contains("tests4ts"));
        assert!(text.contains("mismatched: x 1.0.0 vs 2.0.0"));
        assert!(text.contains("help:"));
    }
}
