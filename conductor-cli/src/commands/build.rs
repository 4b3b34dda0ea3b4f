//! `conductor build`: one-shot or watched build of every target.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use conductor_build::{build_all, BuildOptions, BuildResult, CommandToolchain, FileOutcome};
use conductor_core::Layout;
use conductor_runtime::{
    init_tracing_with_default, run_build_watch, start_blocking, BuildWatchOptions, InitialScan,
};

use super::{display_path, load_project, supervisor_options};

/// Arguments for `conductor build`.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Keep running and rebuild whenever a source file changes.
    #[arg(long)]
    pub watch: bool,

    /// Also produce `<name>.min.js` for browser targets.
    #[arg(long)]
    pub minify: bool,

    /// In watch mode, wait for the first change instead of building everything up front.
    #[arg(long, requires = "watch")]
    pub skip_initial: bool,

    /// In watch mode, run this node target and restart it after each rebuild.
    #[arg(long = "run", value_name = "TARGET", requires = "watch")]
    pub run: Vec<String>,
}

impl BuildArgs {
    pub fn run(self, layout: Layout) -> Result<()> {
        let project = load_project(layout)?;
        let toolchain = CommandToolchain::from_config(&project.layout, &project.config.toolchain);
        let build = BuildOptions {
            minify: self.minify,
        };

        if self.watch {
            let mut run = Vec::with_capacity(self.run.len());
            for name in &self.run {
                let target = project
                    .process_target(name)
                    .with_context(|| format!("cannot run '{name}'"))?;
                run.push(target.name.clone());
            }
            let options = BuildWatchOptions {
                build,
                initial_scan: if self.skip_initial {
                    InitialScan::Ignore
                } else {
                    InitialScan::Emit
                },
                run,
                supervisor: supervisor_options(&project, false),
                ..BuildWatchOptions::default()
            };
            start_blocking(run_build_watch(
                project.layout.clone(),
                project.targets.clone(),
                Arc::new(toolchain),
                options,
            ))
            .context("watch mode exited with error")?;
            return Ok(());
        }

        init_tracing_with_default("warn");
        let results = build_all(&toolchain, &project.targets, &build);
        for result in &results {
            print_result(&project.layout, result);
        }

        let failed = results.iter().filter(|r| !r.success).count();
        if failed > 0 {
            eprintln!(
                "{}",
                format!("{failed} of {} targets failed", results.len()).red()
            );
            std::process::exit(1);
        }
        Ok(())
    }
}

fn print_result(layout: &Layout, result: &BuildResult) {
    let unchanged = result
        .outcomes
        .iter()
        .filter(|o| matches!(o, FileOutcome::Unchanged { .. }))
        .count();
    let elapsed = format!("{}ms", result.duration.as_millis()).bright_black();

    if result.success {
        println!(
            "{} {} ({} written, {} unchanged) {elapsed}",
            "✓".green().bold(),
            result.target,
            result.written(),
            unchanged,
        );
    } else {
        println!(
            "{} {} ({} failed) {elapsed}",
            "✗".red().bold(),
            result.target,
            result.failed(),
        );
    }

    for outcome in &result.outcomes {
        match outcome {
            FileOutcome::Transpiled { output } | FileOutcome::Copied { output } => {
                println!("  ✎  {}", display_path(layout, output));
            }
            FileOutcome::Bundled { output } => {
                println!("  ▣  {}", display_path(layout, output));
            }
            FileOutcome::Removed { output } => {
                println!("  -  {}", display_path(layout, output));
            }
            FileOutcome::Unchanged { .. } => {}
            FileOutcome::Failed { path, detail } => {
                println!(
                    "  {}  {}: {}",
                    "✗".red(),
                    display_path(layout, path),
                    detail
                );
            }
        }
    }
}
