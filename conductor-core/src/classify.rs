//! Target classifier.
//!
//! Turns the `src/clients` listing plus the registry into the ordered list of
//! targets to build. The implicit server comes first, every other node-like
//! target follows in listing order, browser targets come last (also in
//! listing order) because bundling may resolve against already transpiled
//! output.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::{io_err, ConfigError};
use crate::layout::{Layout, DEFAULT_ENTRY, PUBLIC_DIR, SERVER_TARGET};
use crate::registry::{ApplicationConfig, DeclaredTarget};
use crate::types::{is_contained, TargetKind, TargetName, TargetSpec};

/// Names of the folders directly under `src/clients`, sorted.
///
/// Plain files are ignored. A missing `src/clients` yields an empty list.
pub fn list_client_dirs(layout: &Layout) -> Result<Vec<String>, ConfigError> {
    let dir = layout.clients_source();
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut names = Vec::new();
    for entry in std::fs::read_dir(&dir).map_err(|e| io_err(&dir, e))? {
        let entry = entry.map_err(|e| io_err(&dir, e))?;
        let ty = entry.file_type().map_err(|e| io_err(entry.path(), e))?;
        if ty.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// Classify `client_dirs` (in listing order) against `config`.
pub fn classify(
    layout: &Layout,
    client_dirs: &[String],
    config: &ApplicationConfig,
) -> Result<Vec<TargetSpec>, ConfigError> {
    let server = server_target(layout, config)?;

    let mut seen: HashSet<&str> = HashSet::new();
    seen.insert(SERVER_TARGET);

    let mut node_like = vec![server];
    let mut browser = Vec::new();

    for name in client_dirs {
        if name == PUBLIC_DIR {
            return Err(ConfigError::ReservedPath {
                name: name.clone(),
                path: layout.public_dir(),
            });
        }
        if !seen.insert(name.as_str()) {
            return Err(ConfigError::DuplicateTarget { name: name.clone() });
        }

        let entry = entry_for(config, name)?;
        match config.declared_target(name) {
            Some(DeclaredTarget::Browser) => browser.push(TargetSpec {
                name: TargetName::from(name.as_str()),
                kind: TargetKind::Browser,
                input_path: layout.client_source(name),
                output_path: layout.browser_bundle(name),
                entry,
            }),
            declared => node_like.push(TargetSpec {
                name: TargetName::from(name.as_str()),
                kind: match declared {
                    Some(DeclaredTarget::Node) => TargetKind::Node,
                    _ => TargetKind::Passthrough,
                },
                input_path: layout.client_source(name),
                output_path: layout.client_build(name),
                entry,
            }),
        }
    }

    for name in config.clients.keys() {
        if name != SERVER_TARGET && !seen.contains(name.as_str()) {
            tracing::warn!(
                client = %name,
                path = %layout.client_source(name).display(),
                "client declared in registry has no source folder, skipping"
            );
        }
    }

    node_like.extend(browser);
    Ok(node_like)
}

/// List `src/clients` and classify it against `config`.
pub fn classify_at(
    layout: &Layout,
    config: &ApplicationConfig,
) -> Result<Vec<TargetSpec>, ConfigError> {
    let dirs = list_client_dirs(layout)?;
    classify(layout, &dirs, config)
}

fn server_target(layout: &Layout, config: &ApplicationConfig) -> Result<TargetSpec, ConfigError> {
    if let Some(DeclaredTarget::Browser) = config.declared_target(SERVER_TARGET) {
        return Err(ConfigError::InvalidServerEntry {
            kind: TargetKind::Browser.to_string(),
        });
    }
    Ok(TargetSpec {
        name: TargetName::from(SERVER_TARGET),
        kind: TargetKind::Node,
        input_path: layout.server_source(),
        output_path: layout.server_build(),
        entry: entry_for(config, SERVER_TARGET)?,
    })
}

fn entry_for(config: &ApplicationConfig, name: &str) -> Result<PathBuf, ConfigError> {
    let Some(entry) = config.client(name).and_then(|c| c.entry.as_deref()) else {
        return Ok(PathBuf::from(DEFAULT_ENTRY));
    };
    let path = PathBuf::from(entry);
    if entry.is_empty() || !is_contained(&path) {
        return Err(ConfigError::InvalidEntry {
            name: name.to_string(),
            entry: entry.to_string(),
        });
    }
    Ok(path)
}
