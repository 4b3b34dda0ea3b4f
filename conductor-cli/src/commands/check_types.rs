use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use conductor_build::typecheck::check_types;
use conductor_core::Layout;

/// Arguments for `conductor check-types`.
#[derive(Args, Debug)]
pub struct CheckTypesArgs {
    /// tsconfig.json to build; required.
    pub config: Option<PathBuf>,
}

impl CheckTypesArgs {
    pub fn run(self, layout: &Layout) -> Result<()> {
        check_types(layout, self.config.as_deref()).context("type check failed")?;
        println!("{} types OK", "✓".green().bold());
        Ok(())
    }
}
