use std::path::PathBuf;

use conductor_core::TargetName;
use thiserror::Error;

/// Error surface for watching, dispatch and process supervision.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),

    #[error("configuration error: {0}")]
    Config(#[from] conductor_core::ConfigError),

    #[error("build error: {0}")]
    Build(#[from] conductor_build::BuildError),

    #[error("{target}: compiled entry {path} does not exist; rebuild first (conductor build)")]
    MissingArtifact { target: TargetName, path: PathBuf },

    #[error("{target}: failed to start '{program}': {source}")]
    Spawn {
        target: TargetName,
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{target}: failed to stop process {pid}: {detail}")]
    Signal {
        target: TargetName,
        pid: u32,
        detail: String,
    },

    #[error("{0} task join failure: {1}")]
    Join(&'static str, String),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RuntimeError {
    RuntimeError::Io {
        path: path.into(),
        source,
    }
}
