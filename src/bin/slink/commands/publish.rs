//! `slink publish` command
//!
//! Unlinks first so the published package carries no live links, then runs
//! npm publish in the working directory.

use anyhow::Result;

use slink::ops;
use slink::util::shell::Status;

use crate::cli::Cli;
use crate::commands;

pub fn execute(cli: &Cli) -> Result<()> {
    let (ctx, fs, shell) = commands::setup(cli)?;

    let report = ops::publish_project(&ctx, &fs)?;
    for path in &report.removed {
        shell.status(Status::Removed, path);
    }

    shell.status(Status::Finished, format_args!("published {}", ctx.cwd()));
    Ok(())
}
