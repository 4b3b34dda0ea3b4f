//! Conductor core library: the target model and how a project is loaded.
//!
//! Public API surface:
//! - [`types`]: newtypes and target specs
//! - [`layout`]: fixed project-relative paths
//! - [`registry`]: `config/application.json` loading
//! - [`classify`]: ordered target list (node-like first, browser last)
//! - [`project`]: everything above, loaded once per invocation
//! - [`error`]: [`ConfigError`]

pub mod classify;
pub mod error;
pub mod layout;
pub mod project;
pub mod registry;
pub mod types;

pub use error::ConfigError;
pub use layout::Layout;
pub use project::Project;
pub use registry::{ApplicationConfig, ClientEntry, DeclaredTarget, ToolchainConfig};
pub use types::{TargetKind, TargetName, TargetSpec};
