//! # conductor-build
//!
//! Per-target build tasks on top of external tools.
//!
//! Call [`build_target`] to build one classified target, or [`build_all`] to
//! build every target in classifier order. Watch mode uses the incremental
//! entry points [`compile_file`], [`remove_output`] and [`bundle`].

pub mod clean;
pub mod error;
pub mod task;
pub mod toolchain;
pub mod typecheck;
pub mod writer;

pub use error::BuildError;
pub use task::{
    build_all, build_target, bundle, compile_file, remove_output, BuildOptions, BuildResult,
    FileOutcome,
};
pub use toolchain::{CommandToolchain, Toolchain};
