//! Command implementations

pub mod completions;
pub mod link;
pub mod publish;
pub mod unlink;

use anyhow::Result;
use slink::util::context::GlobalContext;
use slink::util::fs::{LinkFs, ProbeMode};
use slink::util::shell::{ColorChoice, Shell};

use crate::cli::Cli;

/// Build the run environment shared by every command.
pub fn setup(cli: &Cli) -> Result<(GlobalContext, LinkFs, Shell)> {
    let mut ctx = GlobalContext::from_dir_override(cli.dir.as_deref())?;
    ctx.set_verbose(cli.verbose);
    ctx.set_color(!cli.no_color);
    if cli.shell_probe {
        ctx.set_probe(ProbeMode::Shell);
    }

    let fs = LinkFs::new(&ctx);
    let color = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let shell = Shell::from_flags(cli.quiet, cli.verbose, color);

    Ok((ctx, fs, shell))
}
