//! Fixed project-relative layout.
//!
//! ```text
//! <root>/
//!   config/application.json   (registry)
//!   src/server/               (implicit server target)
//!   src/clients/<name>/       (one folder per client)
//!   .build/server/
//!   .build/<name>/            (node-like clients)
//!   .build/public/<name>.js   (browser bundles, reserved subpath)
//! ```

use std::path::{Path, PathBuf};

pub const SERVER_TARGET: &str = "server";
pub const DEFAULT_ENTRY: &str = "index.js";

pub const CONFIG_DIR: &str = "config";
pub const REGISTRY_FILE: &str = "application.json";
pub const SOURCE_DIR: &str = "src";
pub const CLIENTS_DIR: &str = "clients";
pub const BUILD_DIR: &str = ".build";
pub const PUBLIC_DIR: &str = "public";

/// Paths of a single project, rooted at `root`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn registry_path(&self) -> PathBuf {
        self.root.join(CONFIG_DIR).join(REGISTRY_FILE)
    }

    pub fn source_dir(&self) -> PathBuf {
        self.root.join(SOURCE_DIR)
    }

    pub fn server_source(&self) -> PathBuf {
        self.source_dir().join(SERVER_TARGET)
    }

    pub fn clients_source(&self) -> PathBuf {
        self.source_dir().join(CLIENTS_DIR)
    }

    pub fn client_source(&self, name: &str) -> PathBuf {
        self.clients_source().join(name)
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root.join(BUILD_DIR)
    }

    pub fn server_build(&self) -> PathBuf {
        self.build_dir().join(SERVER_TARGET)
    }

    pub fn client_build(&self, name: &str) -> PathBuf {
        self.build_dir().join(name)
    }

    /// Reserved output directory for browser bundles.
    pub fn public_dir(&self) -> PathBuf {
        self.build_dir().join(PUBLIC_DIR)
    }

    pub fn browser_bundle(&self, name: &str) -> PathBuf {
        self.public_dir().join(format!("{name}.js"))
    }

    /// Executable installed by the project's package manager.
    pub fn node_bin(&self, tool: &str) -> PathBuf {
        self.root.join("node_modules").join(".bin").join(tool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_rooted() {
        let layout = Layout::new("/app");
        assert_eq!(
            layout.registry_path(),
            PathBuf::from("/app/config/application.json")
        );
        assert_eq!(layout.server_source(), PathBuf::from("/app/src/server"));
        assert_eq!(layout.client_source("ui"), PathBuf::from("/app/src/clients/ui"));
        assert_eq!(layout.client_build("game"), PathBuf::from("/app/.build/game"));
        assert_eq!(
            layout.browser_bundle("ui"),
            PathBuf::from("/app/.build/public/ui.js")
        );
        assert!(layout.node_bin("tsc").ends_with("node_modules/.bin/tsc"));
    }

    #[test]
    fn public_dir_sits_inside_build_dir() {
        let layout = Layout::new("/app");
        assert!(layout.public_dir().starts_with(layout.build_dir()));
        assert_eq!(layout.client_build(PUBLIC_DIR), layout.public_dir());
    }
}
