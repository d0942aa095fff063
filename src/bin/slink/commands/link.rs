//! `slink` / `slink link` command

use anyhow::Result;

use slink::ops::{self, SharedStoreOutcome};
use slink::util::shell::Status;

use crate::cli::Cli;
use crate::commands;

pub fn execute(cli: &Cli) -> Result<()> {
    let (ctx, fs, shell) = commands::setup(cli)?;

    shell.status(Status::Linking, ctx.cwd());
    let report = ops::link_project(&ctx, &fs)?;

    match report.shared_store {
        Some(SharedStoreOutcome::Linked { ref store }) => {
            shell.status(Status::Created, format_args!("node_modules -> {store}"));
        }
        Some(SharedStoreOutcome::NoSiblingFound) => {
            shell.warn("no sibling project with a usable node_modules was found");
        }
        Some(SharedStoreOutcome::NotConfigured) | None => {}
    }

    for line in &report.source_links {
        shell.status(Status::Created, line);
    }
    for line in &report.group_links {
        shell.status(Status::Created, line);
    }

    if report.source_links.is_empty() && report.group_links.is_empty() {
        shell.note("no dependencySrcSLinks or dependencySLinkGroups declared");
    }

    shell.status(Status::Finished, ctx.cwd());
    Ok(())
}
