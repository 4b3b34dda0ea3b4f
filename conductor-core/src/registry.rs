//! Client registry stored in `config/application.json`.
//!
//! ```json
//! {
//!   "clients": {
//!     "game": { "target": "node", "entry": "index.js" },
//!     "ui": { "target": "browser" },
//!     "server": null
//!   },
//!   "toolchain": { "runtime": "node" }
//! }
//! ```
//!
//! The document is read once per invocation. Unknown top-level keys and
//! unknown per-client keys are ignored so the file can be shared with the
//! application itself.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{io_err, ConfigError};
use crate::layout::Layout;

/// Target kind as it may appear in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclaredTarget {
    Node,
    Browser,
}

/// One `clients.<name>` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClientEntry {
    #[serde(default)]
    pub target: Option<DeclaredTarget>,
    /// Compiled entry file name, relative to the client folder.
    #[serde(default)]
    pub entry: Option<String>,
}

/// Optional overrides for the external tools.
///
/// Argument templates may contain `{input}` and `{output}` placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ToolchainConfig {
    #[serde(default)]
    pub transpile: Option<Vec<String>>,
    #[serde(default)]
    pub bundle: Option<Vec<String>>,
    #[serde(default)]
    pub minify: Option<Vec<String>>,
    /// Program used to run node targets (`node` by default).
    #[serde(default)]
    pub runtime: Option<String>,
}

/// Root of `config/application.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApplicationConfig {
    /// `null` values are allowed and mean "no target kind".
    pub clients: BTreeMap<String, Option<ClientEntry>>,
    #[serde(default)]
    pub toolchain: ToolchainConfig,
}

impl ApplicationConfig {
    /// Declared entry for `name`, `None` for absent or `null` entries.
    pub fn client(&self, name: &str) -> Option<&ClientEntry> {
        self.clients.get(name).and_then(Option::as_ref)
    }

    /// Declared kind for `name`, `None` when the client has no target kind.
    pub fn declared_target(&self, name: &str) -> Option<DeclaredTarget> {
        self.client(name).and_then(|entry| entry.target)
    }
}

/// Parse a registry document. `path` is only used for error context.
pub fn parse(path: &Path, contents: &str) -> Result<ApplicationConfig, ConfigError> {
    serde_json::from_str(contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load `<root>/config/application.json`.
///
/// Returns `ConfigError::RegistryNotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed.
pub fn load_at(layout: &Layout) -> Result<ApplicationConfig, ConfigError> {
    let path = layout.registry_path();
    if !path.exists() {
        return Err(ConfigError::RegistryNotFound { path });
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    let config = parse(&path, &contents)?;
    tracing::debug!(
        path = %path.display(),
        clients = config.clients.len(),
        "loaded registry"
    );
    Ok(config)
}
