//! Long-lived process supervision.
//!
//! The [`Supervisor`] owns the process table. Every target moves through
//! `Stopped → Starting → Running → Stopping → Stopped`, and a replacement
//! is only spawned after the previous child's exit has been awaited.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use conductor_core::{TargetName, TargetSpec};
use tokio::process::{Child, Command};

use crate::defaults::{DEFAULT_RUNTIME, INSPECT_ARGS, INSPECT_SETTLE_DELAY, TERMINATION_TIMEOUT};
use crate::error::RuntimeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProcessState {
    #[default]
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProcessState::Stopped => "stopped",
            ProcessState::Starting => "starting",
            ProcessState::Running => "running",
            ProcessState::Stopping => "stopping",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct SupervisorOptions {
    /// Program that runs the compiled entry, `node` by default.
    pub runtime: String,
    pub inspect: bool,
    /// Passed to the runtime before the entry file when `inspect` is set.
    pub inspect_args: Vec<String>,
    pub termination_timeout: Duration,
    pub settle_delay: Duration,
    pub working_dir: Option<PathBuf>,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            runtime: DEFAULT_RUNTIME.to_string(),
            inspect: false,
            inspect_args: INSPECT_ARGS.iter().map(|a| a.to_string()).collect(),
            termination_timeout: TERMINATION_TIMEOUT,
            settle_delay: INSPECT_SETTLE_DELAY,
            working_dir: None,
        }
    }
}

#[derive(Debug)]
struct ManagedProcess {
    child: Child,
    pid: u32,
}

#[derive(Debug, Default)]
pub struct Supervisor {
    options: SupervisorOptions,
    states: HashMap<TargetName, ProcessState>,
    processes: HashMap<TargetName, ManagedProcess>,
}

impl Supervisor {
    pub fn new(options: SupervisorOptions) -> Self {
        Self {
            options,
            states: HashMap::new(),
            processes: HashMap::new(),
        }
    }

    pub fn state(&self, name: &TargetName) -> ProcessState {
        self.states.get(name).copied().unwrap_or_default()
    }

    pub fn pid(&self, name: &TargetName) -> Option<u32> {
        self.processes.get(name).map(|p| p.pid)
    }

    /// Targets with a live child, sorted.
    pub fn tracked(&self) -> Vec<TargetName> {
        let mut names: Vec<TargetName> = self.processes.keys().cloned().collect();
        names.sort();
        names
    }

    /// Spawn the target's compiled entry. A running target is left alone.
    pub fn start(&mut self, target: &TargetSpec) -> Result<u32, RuntimeError> {
        let name = &target.name;
        if let Some(pid) = self.pid(name) {
            tracing::debug!(target = %name, pid, "already running");
            return Ok(pid);
        }

        let artifact = target.artifact();
        if !artifact.is_file() {
            self.states.insert(name.clone(), ProcessState::Stopped);
            return Err(RuntimeError::MissingArtifact {
                target: name.clone(),
                path: artifact,
            });
        }

        self.states.insert(name.clone(), ProcessState::Starting);
        let mut cmd = Command::new(&self.options.runtime);
        if self.options.inspect {
            cmd.args(&self.options.inspect_args);
        }
        cmd.arg(&artifact)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(dir) = &self.options.working_dir {
            cmd.current_dir(dir);
        }

        let spawned = cmd.spawn().and_then(|child| {
            child
                .id()
                .map(|pid| (child, pid))
                .ok_or_else(|| {
                    std::io::Error::new(
                        std::io::ErrorKind::Other,
                        "process exited before its pid was read",
                    )
                })
        });
        let (child, pid) = match spawned {
            Ok(spawned) => spawned,
            Err(source) => {
                self.states.insert(name.clone(), ProcessState::Stopped);
                return Err(RuntimeError::Spawn {
                    target: name.clone(),
                    program: self.options.runtime.clone(),
                    source,
                });
            }
        };

        tracing::info!(target = %name, pid, artifact = %artifact.display(), "process started");
        self.processes
            .insert(name.clone(), ManagedProcess { child, pid });
        self.states.insert(name.clone(), ProcessState::Running);
        Ok(pid)
    }

    /// Stop the current instance (if any), then start a fresh one.
    pub async fn restart(&mut self, target: &TargetSpec) -> Result<u32, RuntimeError> {
        let stopped = self.stop(&target.name).await?;
        if stopped && self.options.inspect {
            tokio::time::sleep(self.options.settle_delay).await;
        }
        self.start(target)
    }

    /// Interrupt the process and await its exit, force-killing on timeout.
    ///
    /// Returns `false` when nothing was running.
    pub async fn stop(&mut self, name: &TargetName) -> Result<bool, RuntimeError> {
        let Some(mut process) = self.processes.remove(name) else {
            return Ok(false);
        };
        self.states.insert(name.clone(), ProcessState::Stopping);
        tracing::info!(target = %name, pid = process.pid, "stopping process");

        if let Err(detail) = interrupt(&mut process) {
            tracing::warn!(target = %name, pid = process.pid, error = %detail, "interrupt failed");
        }

        let timeout = self.options.termination_timeout;
        let result = match tokio::time::timeout(timeout, process.child.wait()).await {
            Ok(Ok(status)) => {
                log_exit(name, process.pid, status);
                Ok(true)
            }
            Ok(Err(err)) => Err(RuntimeError::Signal {
                target: name.clone(),
                pid: process.pid,
                detail: err.to_string(),
            }),
            Err(_) => {
                tracing::warn!(
                    target = %name,
                    pid = process.pid,
                    timeout_ms = timeout.as_millis() as u64,
                    "process did not exit after interrupt; killing"
                );
                process
                    .child
                    .kill()
                    .await
                    .map(|()| true)
                    .map_err(|err| RuntimeError::Signal {
                        target: name.clone(),
                        pid: process.pid,
                        detail: err.to_string(),
                    })
            }
        };
        self.states.insert(name.clone(), ProcessState::Stopped);
        result
    }

    /// Stop every tracked process. Errors are logged, never returned.
    pub async fn stop_all(&mut self) {
        for name in self.tracked() {
            if let Err(err) = self.stop(&name).await {
                tracing::error!(target = %name, error = %err, "stop failed");
            }
        }
    }

    /// Collect children that exited on their own. They stay `Stopped`.
    pub fn reap(&mut self) -> Vec<TargetName> {
        let mut exited = Vec::new();
        for (name, process) in self.processes.iter_mut() {
            match process.child.try_wait() {
                Ok(Some(status)) => {
                    tracing::warn!(
                        target = %name,
                        pid = process.pid,
                        status = %status,
                        "process exited; waiting for the next rebuild"
                    );
                    exited.push(name.clone());
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(target = %name, error = %err, "cannot poll process");
                }
            }
        }
        for name in &exited {
            self.processes.remove(name);
            self.states.insert(name.clone(), ProcessState::Stopped);
        }
        exited.sort();
        exited
    }
}

fn log_exit(name: &TargetName, pid: u32, status: ExitStatus) {
    tracing::info!(target = %name, pid, status = %status, "process exited");
}

#[cfg(unix)]
fn interrupt(process: &mut ManagedProcess) -> Result<(), String> {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    match kill(Pid::from_raw(process.pid as i32), Signal::SIGINT) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(err) => Err(err.to_string()),
    }
}

#[cfg(not(unix))]
fn interrupt(process: &mut ManagedProcess) -> Result<(), String> {
    process.child.start_kill().map_err(|err| err.to_string())
}
