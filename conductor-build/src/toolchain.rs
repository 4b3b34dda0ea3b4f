//! Boundary to the external transpiler and bundler.
//!
//! [`Toolchain`] is the only way build tasks reach a compiler. The production
//! implementation, [`CommandToolchain`], expands argument templates and runs
//! them as child processes from the project root.

use std::path::{Path, PathBuf};
use std::process::Command;

use conductor_core::{Layout, ToolchainConfig};

use crate::error::BuildError;

pub const INPUT_PLACEHOLDER: &str = "{input}";
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// External compiler collaborators.
///
/// Implementations write exactly one file, `output`, per call.
pub trait Toolchain: Send + Sync {
    /// Transpile one node-side source file.
    fn transpile(&self, input: &Path, output: &Path) -> Result<(), BuildError>;

    /// Bundle a browser entry point and its dependency graph.
    fn bundle(&self, input: &Path, output: &Path, minify: bool) -> Result<(), BuildError>;
}

/// Runs templated commands such as
/// `esbuild {input} --bundle --outfile={output}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandToolchain {
    root: PathBuf,
    transpile: Vec<String>,
    bundle: Vec<String>,
    minify: Vec<String>,
}

impl CommandToolchain {
    pub fn new(
        root: impl Into<PathBuf>,
        transpile: Vec<String>,
        bundle: Vec<String>,
        minify: Vec<String>,
    ) -> Self {
        Self {
            root: root.into(),
            transpile,
            bundle,
            minify,
        }
    }

    /// esbuild from the project's `node_modules`, with registry overrides.
    pub fn from_config(layout: &Layout, config: &ToolchainConfig) -> Self {
        let esbuild = layout.node_bin("esbuild").display().to_string();
        let transpile = config.transpile.clone().unwrap_or_else(|| {
            args(&[
                &esbuild,
                INPUT_PLACEHOLDER,
                "--format=cjs",
                "--platform=node",
                "--sourcemap=inline",
                "--outfile={output}",
            ])
        });
        let bundle = config.bundle.clone().unwrap_or_else(|| {
            args(&[
                &esbuild,
                INPUT_PLACEHOLDER,
                "--bundle",
                "--format=iife",
                "--sourcemap=inline",
                "--outfile={output}",
            ])
        });
        let minify = config.minify.clone().unwrap_or_else(|| {
            let mut minify = bundle.clone();
            minify.push("--minify".to_string());
            minify
        });
        Self::new(layout.root(), transpile, bundle, minify)
    }

    fn run(
        &self,
        what: &'static str,
        template: &[String],
        input: &Path,
        output: &Path,
    ) -> Result<(), BuildError> {
        let expanded = expand(template, input, output);
        let (program, rest) = expanded
            .split_first()
            .ok_or(BuildError::EmptyTemplate(what))?;
        let program = self.resolve_program(program);

        tracing::debug!(program = %program.display(), input = %input.display(), "running {what}");
        let output = Command::new(&program)
            .args(rest)
            .current_dir(&self.root)
            .output()
            .map_err(|source| BuildError::ToolNotFound {
                program: program.display().to_string(),
                source,
            })?;

        if output.status.success() {
            return Ok(());
        }
        Err(BuildError::Tool {
            program: program_name(&program),
            input: input.to_path_buf(),
            detail: failure_detail(&output),
        })
    }

    /// Relative programs with a separator are resolved against the project root.
    fn resolve_program(&self, program: &str) -> PathBuf {
        let path = Path::new(program);
        if path.is_relative() && path.components().count() > 1 {
            self.root.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

impl Toolchain for CommandToolchain {
    fn transpile(&self, input: &Path, output: &Path) -> Result<(), BuildError> {
        self.run("transpile", &self.transpile, input, output)
    }

    fn bundle(&self, input: &Path, output: &Path, minify: bool) -> Result<(), BuildError> {
        if minify {
            self.run("minify", &self.minify, input, output)
        } else {
            self.run("bundle", &self.bundle, input, output)
        }
    }
}

/// Substitute `{input}` / `{output}` in every template argument.
pub fn expand(template: &[String], input: &Path, output: &Path) -> Vec<String> {
    let input = input.display().to_string();
    let output = output.display().to_string();
    template
        .iter()
        .map(|arg| {
            arg.replace(INPUT_PLACEHOLDER, &input)
                .replace(OUTPUT_PLACEHOLDER, &output)
        })
        .collect()
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

fn program_name(program: &Path) -> String {
    program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string())
}

fn failure_detail(output: &std::process::Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stdout = stdout.trim();
    if !stdout.is_empty() {
        return stdout.to_string();
    }
    format!("exited with {}", output.status)
}
