use std::time::Duration;

pub const BUILD_DEBOUNCE: Duration = Duration::from_millis(300);
pub const PROCESS_DEBOUNCE: Duration = Duration::from_millis(500);

/// Grace period between SIGINT and a forced kill.
pub const TERMINATION_TIMEOUT: Duration = Duration::from_secs(5);
/// Pause before respawning an inspected process so the debugger port is free.
pub const INSPECT_SETTLE_DELAY: Duration = Duration::from_millis(100);
pub const REAP_INTERVAL: Duration = Duration::from_secs(1);

pub const DEFAULT_RUNTIME: &str = "node";
pub const INSPECT_ARGS: &[&str] = &["--inspect", "--trace-deprecation"];
