pub mod build;
pub mod check_types;
pub mod clean;
pub mod targets;
pub mod watch_process;

use std::path::Path;

use anyhow::{Context, Result};
use conductor_core::{Layout, Project};
use conductor_runtime::SupervisorOptions;

pub(crate) fn load_project(layout: Layout) -> Result<Project> {
    let registry = layout.registry_path();
    Project::load(layout)
        .with_context(|| format!("failed to load project from {}", registry.display()))
}

/// Supervisor settings for this project, honouring a configured runtime.
pub(crate) fn supervisor_options(project: &Project, inspect: bool) -> SupervisorOptions {
    let mut options = SupervisorOptions {
        inspect,
        working_dir: Some(project.layout.root().to_path_buf()),
        ..SupervisorOptions::default()
    };
    if let Some(runtime) = &project.config.toolchain.runtime {
        options.runtime = runtime.clone();
    }
    options
}

/// `path` relative to the project root when possible.
pub(crate) fn display_path(layout: &Layout, path: &Path) -> String {
    path.strip_prefix(layout.root())
        .unwrap_or(path)
        .display()
        .to_string()
}
