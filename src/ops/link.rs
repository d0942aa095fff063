//! The full link pipeline.
//!
//! Strictly sequential: shared store first, then source links, then group
//! links. Each step's filesystem effect must land before the next step runs
//! (a group directory has to exist before its member links go in), so there
//! is nothing to parallelize here. The first failure aborts the run.

use anyhow::Result;

use crate::core::manifest::{ManifestError, PackageManifest, MANIFEST_FILE};
use crate::core::path::PortablePath;
use crate::ops::shared_store::{self, SharedStoreOutcome};
use crate::util::context::GlobalContext;
use crate::util::fs::LinkFs;

/// What one link run created, for the CLI summary.
#[derive(Debug, Default)]
pub struct LinkReport {
    pub shared_store: Option<SharedStoreOutcome>,
    pub source_links: Vec<String>,
    pub group_links: Vec<String>,
}

/// Load the working directory's manifest, failing with the missing path when
/// there is none.
pub fn load_manifest(ctx: &GlobalContext, fs: &LinkFs) -> Result<PackageManifest> {
    let path = ctx.cwd().child(MANIFEST_FILE)?;
    if !fs.exists(&path) {
        return Err(ManifestError::NotFound {
            dir: ctx.cwd_native(),
        }
        .into());
    }
    let content = fs.read_to_string(&path)?;
    PackageManifest::parse(&content, &fs.native(&path))
}

/// Run the whole pipeline in the context's working directory.
pub fn link_project(ctx: &GlobalContext, fs: &LinkFs) -> Result<LinkReport> {
    ctx.ensure_not_install_dir()?;
    let manifest = load_manifest(ctx, fs)?;

    let mut report = LinkReport {
        shared_store: Some(shared_store::resolve_shared_store(ctx, fs, &manifest)?),
        ..LinkReport::default()
    };

    apply_source_links(ctx, fs, &manifest, &mut report)?;
    apply_group_links(ctx, fs, &manifest, &mut report)?;
    Ok(report)
}

/// Create every declared `<project>@slink` link. Link locations and targets
/// resolve against the working directory; a stale link of the same name is
/// removed first.
fn apply_source_links(
    ctx: &GlobalContext,
    fs: &LinkFs,
    manifest: &PackageManifest,
    report: &mut LinkReport,
) -> Result<()> {
    for link in manifest.source_links()? {
        let link_dir = PortablePath::resolve_relative(ctx.cwd(), &link.link_dir);
        let target = PortablePath::resolve_relative(&link_dir, &link.target);
        tracing::debug!("source link {} in {link_dir} -> {target}", link.name);

        let name = PortablePath::parse(&link.name, true)?;
        fs.remove(&name, &link_dir)?;
        fs.create_symlink(&link.name, &target, &link_dir)?;

        report
            .source_links
            .push(format!("{}/{} -> {target}", link_dir, link.name));
    }
    Ok(())
}

/// Rebuild every declared link group from scratch: drop the group directory,
/// recreate it, then link each member. Member targets stay relative so the
/// links survive the tree being moved as a whole.
fn apply_group_links(
    ctx: &GlobalContext,
    fs: &LinkFs,
    manifest: &PackageManifest,
    report: &mut LinkReport,
) -> Result<()> {
    for group in manifest.link_groups()? {
        let container = group.container_dir()?;
        tracing::debug!("rebuilding group directory {container}");

        fs.remove(&container, ctx.cwd())?;
        let group_dir = fs.mkdir_tree(&container, ctx.cwd())?;

        for member in &group.members {
            fs.create_symlink(&member.module_path, &member.target, &group_dir)?;
            report.group_links.push(format!(
                "{group_dir}/{} -> {}",
                member.module_path, member.target
            ));
        }
    }
    Ok(())
}
