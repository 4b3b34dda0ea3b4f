//! Error types for conductor-core.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration errors. Every variant is fatal for the whole invocation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure while reading the registry or listing sources.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The registry file did not exist at the expected path.
    #[error("registry not found at {path}")]
    RegistryNotFound { path: PathBuf },

    /// JSON parse error on load. Carries the file path and the serde_json line/column.
    #[error("invalid registry at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A source folder would write into the reserved browser output directory.
    #[error("client folder '{name}' collides with the reserved output path {path}")]
    ReservedPath { name: String, path: PathBuf },

    /// Two targets share a name.
    #[error("duplicate target name '{name}'")]
    DuplicateTarget { name: String },

    /// The registry declares the server as something other than a node target.
    #[error("the server target can only be declared as \"node\", got \"{kind}\"")]
    InvalidServerEntry { kind: String },

    /// A declared entry file would resolve outside the target's tree.
    #[error("entry '{entry}' of target '{name}' must be a relative path inside the target")]
    InvalidEntry { name: String, entry: String },

    /// No target with that name exists in this project.
    #[error("unknown target '{name}'")]
    UnknownTarget { name: String },

    /// The target exists but cannot be run as a long-lived process.
    #[error("target '{name}' is not declared as {{ \"target\": \"node\" }} (found {kind})")]
    NotAProcessTarget { name: String, kind: String },
}

/// Convenience constructor for [`ConfigError::Io`].
pub fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
