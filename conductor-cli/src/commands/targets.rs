//! `conductor targets`: classified targets in build order.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use conductor_core::{Layout, TargetSpec};

use super::{display_path, load_project};

/// Arguments for `conductor targets`.
#[derive(Args, Debug)]
pub struct TargetsArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize, Tabled)]
struct TargetRow {
    #[tabled(rename = "target")]
    name: String,
    #[tabled(rename = "kind")]
    kind: String,
    #[tabled(rename = "source")]
    input: String,
    #[tabled(rename = "output")]
    output: String,
    #[tabled(rename = "entry")]
    entry: String,
}

impl TargetRow {
    fn new(layout: &Layout, target: &TargetSpec) -> Self {
        Self {
            name: target.name.to_string(),
            kind: target.kind.to_string(),
            input: display_path(layout, &target.input_path),
            output: display_path(layout, &target.output_path),
            entry: target.entry.display().to_string(),
        }
    }
}

impl TargetsArgs {
    pub fn run(self, layout: Layout) -> Result<()> {
        let project = load_project(layout)?;
        let rows: Vec<TargetRow> = project
            .targets
            .iter()
            .map(|t| TargetRow::new(&project.layout, t))
            .collect();

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&rows).context("failed to serialize targets")?
            );
            return Ok(());
        }

        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}
