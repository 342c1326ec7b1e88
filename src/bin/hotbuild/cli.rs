//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// hotbuild - incremental rebuilds and hot reload for small C++ projects
#[derive(Parser)]
#[command(name = "hotbuild")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every command.
#[derive(Args, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: String,

    /// Path to hotbuild.toml (defaults to searching upward from the current directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the program and run it
    Run(RunArgs),

    /// Rebuild the hot-reload library whenever a source file changes
    Watch(WatchArgs),

    /// Show the include graph reachable from the root component
    Walk(WalkArgs),

    /// Re-run the test command whenever a source file changes
    Test(TestArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Root component to build (overrides `run.root`)
    #[arg(long)]
    pub root: Option<String>,

    /// Arguments passed to the program (override `run.args`)
    #[arg(last = true)]
    pub args: Vec<String>,
}

#[derive(Args)]
pub struct WatchArgs {
    /// Recompile every translation unit on the first cycle
    #[arg(long)]
    pub force_build: bool,
}

#[derive(Args)]
pub struct WalkArgs {
    /// Component to scan from (defaults to `project.root`)
    #[arg(long)]
    pub root: Option<String>,

    /// Emit the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct TestArgs {
    /// Test command to run (overrides `test.command`)
    #[arg(long)]
    pub command: Option<String>,
}
