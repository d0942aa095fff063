//! `slink unlink` command

use anyhow::Result;

use slink::ops;
use slink::util::shell::Status;

use crate::cli::Cli;
use crate::commands;

pub fn execute(cli: &Cli) -> Result<()> {
    let (ctx, fs, shell) = commands::setup(cli)?;

    let report = ops::unlink_project(&ctx, &fs)?;
    for path in &report.removed {
        shell.status(Status::Removed, path);
    }
    if report.removed.is_empty() {
        shell.note("nothing to unlink");
    }

    shell.status(Status::Finished, ctx.cwd());
    Ok(())
}
