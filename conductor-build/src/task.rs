//! Per-target build tasks.
//!
//! Node-like targets are built by walking the input tree: `.js` / `.mjs`
//! files go through [`Toolchain::transpile`], everything else is copied.
//! Browser targets are bundled from their entry file, optionally followed
//! by an independent minified pass.
//!
//! Failures are per file: a failed file is recorded, its previous output is
//! left in place and the rest of the batch continues.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use conductor_core::{TargetKind, TargetName, TargetSpec};

use crate::error::{io_err, BuildError};
use crate::toolchain::Toolchain;
use crate::writer::{self, WriteOutcome};

/// Extensions handed to the transpiler. Everything else is copied verbatim.
pub const TRANSPILED_EXTENSIONS: &[&str] = &["js", "mjs"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Also produce `<name>.min.js` for browser targets.
    pub minify: bool,
}

/// What happened to a single output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Transpiled { output: PathBuf },
    Copied { output: PathBuf },
    Unchanged { output: PathBuf },
    Bundled { output: PathBuf },
    Removed { output: PathBuf },
    Failed { path: PathBuf, detail: String },
}

impl FileOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, FileOutcome::Failed { .. })
    }

    /// `true` when the artifact on disk changed.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            FileOutcome::Transpiled { .. }
                | FileOutcome::Copied { .. }
                | FileOutcome::Bundled { .. }
                | FileOutcome::Removed { .. }
        )
    }

    fn failed(path: &Path, err: &BuildError) -> Self {
        FileOutcome::Failed {
            path: path.to_path_buf(),
            detail: err.to_string(),
        }
    }
}

/// Result of one build attempt for one target. Never persisted.
#[derive(Debug, Clone)]
pub struct BuildResult {
    pub target: TargetName,
    pub success: bool,
    pub error_detail: Option<String>,
    pub outcomes: Vec<FileOutcome>,
    pub duration: Duration,
}

impl BuildResult {
    pub fn from_outcomes(
        target: &TargetSpec,
        outcomes: Vec<FileOutcome>,
        started: Instant,
    ) -> Self {
        let failures: Vec<String> = outcomes
            .iter()
            .filter_map(|o| match o {
                FileOutcome::Failed { detail, .. } => Some(detail.clone()),
                _ => None,
            })
            .collect();
        Self {
            target: target.name.clone(),
            success: failures.is_empty(),
            error_detail: (!failures.is_empty()).then(|| failures.join("\n")),
            outcomes,
            duration: started.elapsed(),
        }
    }

    /// Number of artifacts created, replaced or deleted.
    pub fn written(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_write()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }
}

// ---------------------------------------------------------------------------
// Full builds
// ---------------------------------------------------------------------------

/// Build every target sequentially, in the given (classifier) order.
pub fn build_all<T: Toolchain + ?Sized>(
    toolchain: &T,
    targets: &[TargetSpec],
    options: &BuildOptions,
) -> Vec<BuildResult> {
    targets
        .iter()
        .map(|target| build_target(toolchain, target, options))
        .collect()
}

/// Build one target from scratch. Returns after every output is written.
pub fn build_target<T: Toolchain + ?Sized>(
    toolchain: &T,
    target: &TargetSpec,
    options: &BuildOptions,
) -> BuildResult {
    let started = Instant::now();
    tracing::info!(target = %target.name, kind = %target.kind, "building");

    let outcomes = match target.kind {
        TargetKind::Browser => bundle(toolchain, target, options.minify),
        TargetKind::Node | TargetKind::Passthrough => build_tree(toolchain, target),
    };

    let result = BuildResult::from_outcomes(target, outcomes, started);
    if result.success {
        tracing::info!(
            target = %target.name,
            written = result.written(),
            elapsed_ms = result.duration.as_millis() as u64,
            "build finished"
        );
    } else {
        tracing::error!(
            target = %target.name,
            failed = result.failed(),
            "build finished with errors"
        );
    }
    result
}

fn build_tree<T: Toolchain + ?Sized>(toolchain: &T, target: &TargetSpec) -> Vec<FileOutcome> {
    let mut sources = Vec::new();
    if let Err(err) = collect_files(&target.input_path, &mut sources) {
        return vec![FileOutcome::failed(&target.input_path, &err)];
    }
    sources.sort();
    sources
        .iter()
        .map(|source| compile_file(toolchain, target, source))
        .collect()
}

/// Every regular file below `dir`, skipping in-flight temporaries.
fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), BuildError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(io_err(dir, err)),
    };
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| io_err(&path, e))?;
        if file_type.is_dir() {
            collect_files(&path, out)?;
        } else if !writer::is_tmp_path(&path) {
            out.push(path);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Incremental operations
// ---------------------------------------------------------------------------

/// Transpile or copy one source file of a node-like target.
pub fn compile_file<T: Toolchain + ?Sized>(
    toolchain: &T,
    target: &TargetSpec,
    source: &Path,
) -> FileOutcome {
    let Some(output) = target.output_for(source) else {
        let err = BuildError::OutsideTarget {
            path: source.to_path_buf(),
        };
        tracing::error!(target = %target.name, "{err}");
        return FileOutcome::failed(source, &err);
    };

    let result = if is_transpiled(source) {
        transpile_one(toolchain, source, &output).map(|w| match w {
            WriteOutcome::Written => FileOutcome::Transpiled { output },
            WriteOutcome::Unchanged => FileOutcome::Unchanged { output },
        })
    } else {
        writer::copy_if_changed(source, &output).map(|w| match w {
            WriteOutcome::Written => FileOutcome::Copied { output },
            WriteOutcome::Unchanged => FileOutcome::Unchanged { output },
        })
    };

    match result {
        Ok(outcome) => {
            tracing::debug!(target = %target.name, ?outcome, "compiled");
            outcome
        }
        Err(err) => {
            tracing::error!(target = %target.name, source = %source.display(), "{err}");
            FileOutcome::failed(source, &err)
        }
    }
}

fn transpile_one<T: Toolchain + ?Sized>(
    toolchain: &T,
    source: &Path,
    output: &Path,
) -> Result<WriteOutcome, BuildError> {
    writer::ensure_parent(output)?;
    let tmp = writer::tmp_path(output);
    if let Err(err) = toolchain.transpile(source, &tmp) {
        let _ = std::fs::remove_file(&tmp);
        return Err(err);
    }
    writer::commit(&tmp, output)
}

/// Delete exactly the output mapped from `source`. Nothing else is pruned.
pub fn remove_output(target: &TargetSpec, source: &Path) -> FileOutcome {
    let Some(output) = target.output_for(source) else {
        let err = BuildError::OutsideTarget {
            path: source.to_path_buf(),
        };
        return FileOutcome::failed(source, &err);
    };
    // A renamed-away source folder maps onto a mirrored output folder.
    let removed = if output.is_dir() {
        writer::remove_dir(&output)
    } else {
        writer::remove_file(&output)
    };
    match removed {
        Ok(true) => {
            tracing::info!(target = %target.name, output = %output.display(), "removed");
            FileOutcome::Removed { output }
        }
        Ok(false) => FileOutcome::Unchanged { output },
        Err(err) => {
            tracing::error!(target = %target.name, "{err}");
            FileOutcome::failed(&output, &err)
        }
    }
}

/// Bundle a browser target; with `minify`, run a second independent pass.
///
/// A failed minified pass never touches the non-minified artifact.
pub fn bundle<T: Toolchain + ?Sized>(
    toolchain: &T,
    target: &TargetSpec,
    minify: bool,
) -> Vec<FileOutcome> {
    let entry = target.entry_source();
    if !entry.is_file() {
        let err = BuildError::MissingEntry { path: entry };
        tracing::error!(target = %target.name, "{err}");
        return vec![FileOutcome::failed(&target.input_path, &err)];
    }

    let mut outcomes = vec![bundle_pass(toolchain, target, &entry, &target.output_path, false)];
    if minify {
        if let Some(min_output) = target.minified_artifact() {
            outcomes.push(bundle_pass(toolchain, target, &entry, &min_output, true));
        }
    }
    outcomes
}

fn bundle_pass<T: Toolchain + ?Sized>(
    toolchain: &T,
    target: &TargetSpec,
    entry: &Path,
    output: &Path,
    minify: bool,
) -> FileOutcome {
    let result = writer::ensure_parent(output).and_then(|()| {
        let tmp = writer::tmp_path(output);
        if let Err(err) = toolchain.bundle(entry, &tmp, minify) {
            let _ = std::fs::remove_file(&tmp);
            return Err(err);
        }
        writer::commit(&tmp, output)
    });
    match result {
        Ok(WriteOutcome::Written) => FileOutcome::Bundled {
            output: output.to_path_buf(),
        },
        Ok(WriteOutcome::Unchanged) => FileOutcome::Unchanged {
            output: output.to_path_buf(),
        },
        Err(err) => {
            tracing::error!(target = %target.name, minify, "{err}");
            FileOutcome::failed(output, &err)
        }
    }
}

fn is_transpiled(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| TRANSPILED_EXTENSIONS.contains(&e))
}
