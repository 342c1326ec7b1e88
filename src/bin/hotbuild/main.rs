//! hotbuild CLI - incremental rebuilds and hot reload for small C++ projects

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use hotbuild::ScanError;

fn main() {
    match run() {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {:#}", e);
            if let Some(help) = e.downcast_ref::<ScanError>().and_then(ScanError::help) {
                eprintln!("{}", help);
            }
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.global.verbose {
        EnvFilter::new("hotbuild=debug")
    } else {
        EnvFilter::new("hotbuild=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    // Execute command
    match cli.command {
        Commands::Run(args) => commands::run::execute(args, &cli.global),
        Commands::Watch(args) => commands::watch::execute(args, &cli.global).map(|()| 0),
        Commands::Walk(args) => commands::walk::execute(args, &cli.global).map(|()| 0),
        Commands::Test(args) => commands::test::execute(args, &cli.global).map(|()| 0),
    }
}
