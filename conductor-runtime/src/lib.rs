//! Watch mode and process supervision.
//!
//! [`run_build_watch`] rebuilds targets as their sources change and can keep
//! node targets running; [`run_process_watch`] restarts one compiled target
//! whenever its build output changes.

pub mod debounce;
pub mod defaults;
mod error;
mod runtime;
pub mod supervisor;
pub mod watch;

pub use error::RuntimeError;
pub use runtime::{
    init_tracing, init_tracing_with_default, run_build_watch, run_build_watch_until,
    run_process_watch, run_process_watch_until, shutdown_signal, start_blocking,
    BuildWatchOptions, ProcessWatchOptions,
};
pub use supervisor::{ProcessState, Supervisor, SupervisorOptions};
pub use watch::{InitialScan, WatchEvent, WatchSession};
