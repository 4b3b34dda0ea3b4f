//! Domain types for build targets.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed target name (`server` or a client folder name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetName(pub String);

impl TargetName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for TargetName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TargetName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// How a target is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// Node-like runtime target; transpiled file by file and runnable as a process.
    Node,
    /// Browser target; bundled into a single artifact under the public directory.
    Browser,
    /// Shared or undeclared folder; transpiled and copied like a node target.
    #[default]
    Passthrough,
}

impl TargetKind {
    /// `true` for every kind built by transpile-and-copy.
    pub fn is_node_like(self) -> bool {
        !matches!(self, TargetKind::Browser)
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Node => write!(f, "node"),
            TargetKind::Browser => write!(f, "browser"),
            TargetKind::Passthrough => write!(f, "passthrough"),
        }
    }
}

// ---------------------------------------------------------------------------
// Target specs
// ---------------------------------------------------------------------------

/// One buildable target. Immutable once classified.
///
/// For node-like targets `input_path` and `output_path` are directories.
/// For browser targets `input_path` is the client folder and `output_path`
/// is the bundle file inside the reserved public directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetSpec {
    pub name: TargetName,
    pub kind: TargetKind,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// Entry file, relative to the target root.
    pub entry: PathBuf,
}

impl TargetSpec {
    /// Output file for a node-like source file.
    ///
    /// Returns `None` when `source` is not inside `input_path` or tries to
    /// escape it, so callers can never write outside the output tree.
    pub fn output_for(&self, source: &Path) -> Option<PathBuf> {
        let relative = source.strip_prefix(&self.input_path).ok()?;
        if relative.as_os_str().is_empty() || !is_contained(relative) {
            return None;
        }
        Some(self.output_path.join(relative))
    }

    /// Entry source file (`<input>/<entry>`); the bundler input for browser targets.
    pub fn entry_source(&self) -> PathBuf {
        self.input_path.join(&self.entry)
    }

    /// File the process supervisor runs: `<output>/<entry>` for node-like targets.
    pub fn artifact(&self) -> PathBuf {
        match self.kind {
            TargetKind::Browser => self.output_path.clone(),
            TargetKind::Node | TargetKind::Passthrough => self.output_path.join(&self.entry),
        }
    }

    /// `<name>.min.js` next to the browser bundle. `None` for node-like targets.
    pub fn minified_artifact(&self) -> Option<PathBuf> {
        if self.kind != TargetKind::Browser {
            return None;
        }
        let stem = self.output_path.file_stem()?.to_string_lossy().into_owned();
        Some(self.output_path.with_file_name(format!("{stem}.min.js")))
    }
}

/// `true` if a relative path has no root, prefix or `..` components.
pub fn is_contained(relative: &Path) -> bool {
    relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn node_target() -> TargetSpec {
        TargetSpec {
            name: TargetName::from("game"),
            kind: TargetKind::Node,
            input_path: PathBuf::from("/app/src/clients/game"),
            output_path: PathBuf::from("/app/.build/game"),
            entry: PathBuf::from("index.js"),
        }
    }

    #[test]
    fn newtype_display() {
        assert_eq!(TargetName::from("ui").to_string(), "ui");
        assert_eq!(TargetKind::Passthrough.to_string(), "passthrough");
    }

    #[test]
    fn output_for_mirrors_relative_path() {
        let target = node_target();
        let out = target
            .output_for(Path::new("/app/src/clients/game/lib/a.js"))
            .expect("inside input");
        assert_eq!(out, PathBuf::from("/app/.build/game/lib/a.js"));
    }

    #[test]
    fn output_for_rejects_foreign_and_escaping_paths() {
        let target = node_target();
        assert!(target.output_for(Path::new("/app/src/server/a.js")).is_none());
        assert!(target
            .output_for(Path::new("/app/src/clients/game/../ui/a.js"))
            .is_none());
        assert!(target.output_for(Path::new("/app/src/clients/game")).is_none());
    }

    #[test]
    fn browser_artifacts() {
        let target = TargetSpec {
            name: TargetName::from("ui"),
            kind: TargetKind::Browser,
            input_path: PathBuf::from("/app/src/clients/ui"),
            output_path: PathBuf::from("/app/.build/public/ui.js"),
            entry: PathBuf::from("index.js"),
        };
        assert_eq!(target.artifact(), PathBuf::from("/app/.build/public/ui.js"));
        assert_eq!(
            target.minified_artifact(),
            Some(PathBuf::from("/app/.build/public/ui.min.js"))
        );
        assert_eq!(node_target().minified_artifact(), None);
    }

    #[test]
    fn kind_serde_is_lowercase() {
        let json = serde_json::to_string(&TargetKind::Browser).expect("serialize");
        assert_eq!(json, "\"browser\"");
        assert!(TargetKind::Node.is_node_like());
        assert!(!TargetKind::Browser.is_node_like());
    }
}
