//! Compare-then-commit artifact writes.
//!
//! Tools never write a final artifact directly. They write to a
//! `<name>.conductor.tmp` sibling, then [`commit`]:
//!
//! 1. Read the fresh bytes from the `.tmp` file.
//! 2. Compare with the existing artifact → drop the `.tmp` if identical.
//! 3. Rename the `.tmp` over the artifact (atomic on POSIX).
//!
//! Rebuilding without source changes therefore leaves artifact bytes and
//! mtimes untouched.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{io_err, BuildError};

pub const TMP_SUFFIX: &str = ".conductor.tmp";

/// Outcome of an individual artifact write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The artifact was created or its content changed.
    Written,
    /// The fresh content matches the artifact on disk.
    Unchanged,
}

/// `<output>.conductor.tmp`, always in the same directory as `output`.
pub fn tmp_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!("{name}{TMP_SUFFIX}"))
}

/// `true` for in-flight temporary files, which watchers must ignore.
pub fn is_tmp_path(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(TMP_SUFFIX))
}

pub fn ensure_parent(path: &Path) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    Ok(())
}

/// Move a tool-written `tmp` over `output` unless the bytes are identical.
pub fn commit(tmp: &Path, output: &Path) -> Result<WriteOutcome, BuildError> {
    let fresh = std::fs::read(tmp).map_err(|e| io_err(tmp, e))?;
    if matches_existing(output, &fresh)? {
        let _ = std::fs::remove_file(tmp);
        return Ok(WriteOutcome::Unchanged);
    }
    if let Err(e) = std::fs::rename(tmp, output) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(output, e));
    }
    Ok(WriteOutcome::Written)
}

/// Write `content` to `output` through a `.tmp` sibling unless identical.
pub fn write_if_changed(output: &Path, content: &[u8]) -> Result<WriteOutcome, BuildError> {
    if matches_existing(output, content)? {
        return Ok(WriteOutcome::Unchanged);
    }
    ensure_parent(output)?;
    let tmp = tmp_path(output);
    std::fs::write(&tmp, content).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, output) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(output, e));
    }
    Ok(WriteOutcome::Written)
}

/// Copy `source` to `output` unless identical.
pub fn copy_if_changed(source: &Path, output: &Path) -> Result<WriteOutcome, BuildError> {
    let content = std::fs::read(source).map_err(|e| io_err(source, e))?;
    write_if_changed(output, &content)
}

/// Delete `output`. Returns `false` if it was already gone.
pub fn remove_file(output: &Path) -> Result<bool, BuildError> {
    match std::fs::remove_file(output) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(io_err(output, err)),
    }
}

/// Remove an output directory and everything below it.
pub fn remove_dir(output: &Path) -> Result<bool, BuildError> {
    match std::fs::remove_dir_all(output) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(io_err(output, err)),
    }
}

fn matches_existing(output: &Path, content: &[u8]) -> Result<bool, BuildError> {
    match std::fs::read(output) {
        Ok(existing) => Ok(existing == content),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(io_err(output, err)),
    }
}
