//! A project loaded once per invocation: layout, registry and classified targets.

use crate::classify;
use crate::error::ConfigError;
use crate::layout::{Layout, SERVER_TARGET};
use crate::registry::{self, ApplicationConfig};
use crate::types::{TargetKind, TargetSpec};

/// Immutable view of the project for the lifetime of one command.
#[derive(Debug, Clone)]
pub struct Project {
    pub layout: Layout,
    pub config: ApplicationConfig,
    /// Build order: node-like targets first, browser targets last.
    pub targets: Vec<TargetSpec>,
}

impl Project {
    /// Load the registry and classify the client folders.
    pub fn load(layout: Layout) -> Result<Self, ConfigError> {
        let config = registry::load_at(&layout)?;
        let targets = classify::classify_at(&layout, &config)?;
        Ok(Self {
            layout,
            config,
            targets,
        })
    }

    pub fn target(&self, name: &str) -> Option<&TargetSpec> {
        self.targets.iter().find(|t| t.name.as_str() == name)
    }

    /// Resolve a target that can run as a long-lived process.
    ///
    /// Only the server and clients declared `"target": "node"` qualify.
    pub fn process_target(&self, name: &str) -> Result<&TargetSpec, ConfigError> {
        let target = self.target(name).ok_or_else(|| ConfigError::UnknownTarget {
            name: name.to_string(),
        })?;
        if target.kind != TargetKind::Node {
            return Err(ConfigError::NotAProcessTarget {
                name: name.to_string(),
                kind: target.kind.to_string(),
            });
        }
        Ok(target)
    }

    pub fn server(&self) -> Option<&TargetSpec> {
        self.target(SERVER_TARGET)
    }
}
