//! `conductor watch-process`: supervise one compiled node target.

use anyhow::{Context, Result};
use clap::Args;

use conductor_core::Layout;
use conductor_runtime::{run_process_watch, start_blocking, ProcessWatchOptions};

use super::{load_project, supervisor_options};

/// Arguments for `conductor watch-process`.
#[derive(Args, Debug)]
pub struct WatchProcessArgs {
    /// `server` or a client declared with `"target": "node"`.
    pub name: String,

    /// Start the runtime with the inspector enabled.
    #[arg(long)]
    pub inspect: bool,
}

impl WatchProcessArgs {
    pub fn run(self, layout: Layout) -> Result<()> {
        let project = load_project(layout)?;
        let target = project
            .process_target(&self.name)
            .with_context(|| format!("cannot watch '{}'", self.name))?
            .clone();

        let options = ProcessWatchOptions {
            supervisor: supervisor_options(&project, self.inspect),
            ..ProcessWatchOptions::default()
        };
        start_blocking(run_process_watch(project.layout.clone(), target, options))
            .with_context(|| format!("watch-process '{}' exited with error", self.name))
    }
}
