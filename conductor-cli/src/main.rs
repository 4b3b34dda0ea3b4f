//! Conductor: build, watch and run the targets of a JavaScript project.
//!
//! # Usage
//!
//! ```text
//! conductor [--root <dir>] build [--watch] [--minify] [--skip-initial] [--run <name>]...
//! conductor [--root <dir>] watch-process <name> [--inspect]
//! conductor [--root <dir>] clean
//! conductor [--root <dir>] check-types [<tsconfig>]
//! conductor [--root <dir>] targets [--json]
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use commands::{
    build::BuildArgs, check_types::CheckTypesArgs, clean::CleanArgs, targets::TargetsArgs,
    watch_process::WatchProcessArgs,
};
use conductor_core::Layout;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "conductor",
    version,
    about = "Build, watch and run the server, node and browser targets of a project",
    long_about = None,
)]
struct Cli {
    /// Project root containing config/application.json (defaults to the current directory).
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build every target once, or keep rebuilding with --watch.
    Build(BuildArgs),

    /// Run a compiled node target and restart it when its output changes.
    WatchProcess(WatchProcessArgs),

    /// Remove the build output directory.
    Clean(CleanArgs),

    /// Run the TypeScript compiler against a tsconfig.
    CheckTypes(CheckTypesArgs),

    /// List the classified targets in build order.
    Targets(TargetsArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().context("could not determine current directory")?,
    };
    let layout = Layout::new(root);

    match cli.command {
        Commands::Build(args) => args.run(layout),
        Commands::WatchProcess(args) => args.run(layout),
        Commands::Clean(args) => args.run(&layout),
        Commands::CheckTypes(args) => args.run(&layout),
        Commands::Targets(args) => args.run(layout),
    }
}
