use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use conductor_build::clean::clean;
use conductor_core::Layout;

use super::display_path;

/// Arguments for `conductor clean`.
#[derive(Args, Debug)]
pub struct CleanArgs {}

impl CleanArgs {
    pub fn run(self, layout: &Layout) -> Result<()> {
        let build_dir = layout.build_dir();
        let removed = clean(layout)
            .with_context(|| format!("failed to remove {}", build_dir.display()))?;
        if removed {
            println!("{} removed {}", "✓".green().bold(), display_path(layout, &build_dir));
        } else {
            println!("nothing to clean");
        }
        Ok(())
    }
}
