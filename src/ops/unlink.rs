//! Tearing links back down, and the publish flow built on top of it.

use anyhow::{Context, Result};

use crate::core::path::PortablePath;
use crate::ops::link::load_manifest;
use crate::util::context::GlobalContext;
use crate::util::fs::LinkFs;
use crate::util::process::{find_npm, ProcessBuilder};

/// What an unlink run removed, for the CLI summary.
#[derive(Debug, Default)]
pub struct UnlinkReport {
    pub removed: Vec<String>,
}

/// Remove everything a link run creates.
///
/// `node_modules` goes only when it is a link; a real directory holding
/// installed packages is left alone. Source links and group directories are
/// removed unconditionally, and a name that is already gone is a no-op.
pub fn unlink_project(ctx: &GlobalContext, fs: &LinkFs) -> Result<UnlinkReport> {
    ctx.ensure_not_install_dir()?;
    let manifest = load_manifest(ctx, fs)?;
    let mut report = UnlinkReport::default();

    let node_modules = ctx.cwd().child("node_modules")?;
    if fs.is_symlink(&node_modules) {
        fs.remove(&node_modules, ctx.cwd())?;
        report.removed.push(node_modules.to_string());
    }

    for link in manifest.source_links()? {
        let link_dir = PortablePath::resolve_relative(ctx.cwd(), &link.link_dir);
        let name = PortablePath::parse(&link.name, true)?;
        if fs.exists_in(&name, &link_dir) {
            fs.remove(&name, &link_dir)?;
            report.removed.push(format!("{link_dir}/{}", link.name));
        }
    }

    for group in manifest.link_groups()? {
        let container = group.container_dir()?;
        if fs.exists_in(&container, ctx.cwd()) {
            fs.remove(&container, ctx.cwd())?;
            report.removed.push(container.to_string());
        }
    }

    Ok(report)
}

/// Unlink, then hand the tree to `npm publish` through the command shell.
/// Publishing a tree that still holds live links would ship symlinks (or
/// their expanded contents) inside the package.
pub fn publish_project(ctx: &GlobalContext, fs: &LinkFs) -> Result<UnlinkReport> {
    let report = unlink_project(ctx, fs)?;

    let npm = find_npm().context("npm is not on PATH; cannot publish")?;
    ProcessBuilder::new(npm.to_string_lossy())
        .arg("publish")
        .cwd(ctx.cwd_native())
        .exec_and_check()
        .context("npm publish failed")?;

    Ok(report)
}
