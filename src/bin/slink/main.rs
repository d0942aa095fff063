//! slink CLI - symlink orchestration for sibling node projects

use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::sync::Mutex;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use slink::core::manifest::ManifestError;
use slink::util::context::GlobalContext;
use slink::ops::StoreError;
use slink::util::diagnostic::{suggestions, Diagnostic};
use slink::util::fs::FsError;

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color && std::io::stderr().is_terminal();

    if let Err(e) = run(&cli) {
        report_error(&e, color);
        std::process::exit(exit_code(&e));
    }
}

fn run(cli: &Cli) -> Result<()> {
    init_logging(cli)?;

    match &cli.command {
        None => commands::link::execute(cli),
        Some(Commands::Link(_)) => commands::link::execute(cli),
        Some(Commands::Unlink(_)) => commands::unlink::execute(cli),
        Some(Commands::Publish(_)) => commands::publish::execute(cli),
        Some(Commands::Completions(args)) => commands::completions::execute(args),
    }
}

fn init_logging(cli: &Cli) -> Result<()> {
    let filter = if cli.verbose {
        EnvFilter::new("slink=debug")
    } else {
        EnvFilter::new("slink=info")
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time();

    if cli.log {
        // The log belongs next to the project being linked, not wherever the
        // shell happens to be; appending keeps earlier runs readable.
        let workdir = GlobalContext::from_dir_override(cli.dir.as_deref())?.cwd_native();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(workdir.join("slink.log"))?;
        builder.with_ansi(false).with_writer(Mutex::new(file)).init();
    } else {
        builder.with_writer(std::io::stderr).init();
    }
    Ok(())
}

/// Shared-store failures carry their own historical exit codes; everything
/// else exits 1.
fn exit_code(e: &anyhow::Error) -> i32 {
    match e.downcast_ref::<StoreError>() {
        Some(store) => store.exit_code(),
        None => 1,
    }
}

fn report_error(e: &anyhow::Error, color: bool) {
    if let Some(store) = e.downcast_ref::<StoreError>() {
        eprintln!("{}", store.to_diagnostic().format(color));
        return;
    }
    if let Some(err @ ManifestError::NotFound { .. }) = e.downcast_ref::<ManifestError>() {
        let diag = Diagnostic::error(err.to_string()).with_suggestion(suggestions::NO_MANIFEST);
        eprintln!("{}", diag.format(color));
        return;
    }
    if let Some(fs_err) = e.downcast_ref::<FsError>() {
        let diag = Diagnostic::error(fs_err.to_string()).with_suggestion(suggestions::RUN_ELEVATED);
        eprintln!("{}", diag.format(color));
        return;
    }
    eprintln!("error: {:#}", e);
}
