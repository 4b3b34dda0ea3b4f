//! Error types for conductor-build.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from build operations.
#[derive(Debug, Error)]
pub enum BuildError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The external tool could not be started at all.
    #[error("cannot run '{program}': {source} (are the project dependencies installed?)")]
    ToolNotFound {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The external tool ran and reported a failure.
    #[error("{program} failed on {input}: {detail}")]
    Tool {
        program: String,
        input: PathBuf,
        detail: String,
    },

    /// An argument template has no program.
    #[error("empty command template for {0}")]
    EmptyTemplate(&'static str),

    /// A source file does not belong to the target being built.
    #[error("{path} is outside the target source tree")]
    OutsideTarget { path: PathBuf },

    /// The entry file of a target does not exist.
    #[error("entry file not found: {path}")]
    MissingEntry { path: PathBuf },

    /// `check-types` was invoked without a config path.
    #[error("no type-check config given; pass the path to a tsconfig.json")]
    MissingTypecheckConfig,

    /// The type checker ran and reported errors.
    #[error("type checking failed ({status})")]
    TypecheckFailed { status: String },
}

/// Convenience constructor for [`BuildError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> BuildError {
    BuildError::Io {
        path: path.into(),
        source,
    }
}
