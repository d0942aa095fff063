//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};

/// slink - link sibling project source trees with symlinks
#[derive(Parser)]
#[command(name = "slink")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Working directory to run in (conventionally --dir `pwd`)
    #[arg(long, global = true)]
    pub dir: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress status output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Write a debug log to slink.log in the working directory
    #[arg(long, global = true)]
    pub log: bool,

    /// Probe the filesystem through the shell instead of native calls
    #[arg(long, global = true)]
    pub shell_probe: bool,

    /// Running without a subcommand links the current project.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Link the shared store, source links and link groups (the default)
    Link(LinkArgs),

    /// Remove every link a link run creates
    Unlink(UnlinkArgs),

    /// Unlink, then run npm publish in the working directory
    Publish(PublishArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct LinkArgs {}

#[derive(Args)]
pub struct UnlinkArgs {}

#[derive(Args)]
pub struct PublishArgs {}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
