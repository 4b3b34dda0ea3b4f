use std::collections::HashSet;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use conductor_build::{bundle, compile_file, remove_output, BuildOptions, BuildResult, Toolchain};
use conductor_core::{Layout, TargetKind, TargetName, TargetSpec};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use crate::debounce::{Batch, Debouncer};
use crate::defaults::{BUILD_DEBOUNCE, PROCESS_DEBOUNCE, REAP_INTERVAL};
use crate::error::{io_err, RuntimeError};
use crate::supervisor::{ProcessState, Supervisor, SupervisorOptions};
use crate::watch::{self, InitialScan, WatchEvent, WatchSession};

#[derive(Debug, Clone)]
pub struct BuildWatchOptions {
    pub build: BuildOptions,
    pub initial_scan: InitialScan,
    /// Node targets to run as processes alongside the build.
    pub run: Vec<TargetName>,
    pub supervisor: SupervisorOptions,
    pub debounce: Duration,
}

impl Default for BuildWatchOptions {
    fn default() -> Self {
        Self {
            build: BuildOptions::default(),
            initial_scan: InitialScan::Emit,
            run: Vec::new(),
            supervisor: SupervisorOptions::default(),
            debounce: BUILD_DEBOUNCE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessWatchOptions {
    pub supervisor: SupervisorOptions,
    pub debounce: Duration,
}

impl Default for ProcessWatchOptions {
    fn default() -> Self {
        Self {
            supervisor: SupervisorOptions::default(),
            debounce: PROCESS_DEBOUNCE,
        }
    }
}

/// Install tracing and drive `future` on a fresh multi-threaded runtime.
pub fn start_blocking<F>(future: F) -> Result<(), RuntimeError>
where
    F: Future<Output = Result<(), RuntimeError>>,
{
    init_tracing();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(future)
}

pub fn init_tracing() {
    init_tracing_with_default("info");
}

/// Log to stderr, filtered by `RUST_LOG` or `default` when unset.
pub fn init_tracing_with_default(default: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received ctrl-c, shutting down"),
        Err(err) => tracing::error!(error = %err, "ctrl-c handler failed, shutting down"),
    }
}

// ---------------------------------------------------------------------------
// build --watch
// ---------------------------------------------------------------------------

/// Watch every target's sources and rebuild on change until Ctrl-C.
pub async fn run_build_watch(
    layout: Layout,
    targets: Vec<TargetSpec>,
    toolchain: Arc<dyn Toolchain>,
    options: BuildWatchOptions,
) -> Result<(), RuntimeError> {
    run_build_watch_until(layout, targets, toolchain, options, shutdown_signal()).await
}

/// [`run_build_watch`] with an explicit shutdown future.
pub async fn run_build_watch_until(
    layout: Layout,
    targets: Vec<TargetSpec>,
    toolchain: Arc<dyn Toolchain>,
    options: BuildWatchOptions,
    shutdown: impl Future<Output = ()>,
) -> Result<(), RuntimeError> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut sessions = attach_all(&targets, options.initial_scan, &tx)?;
    drop(tx);

    for name in &options.run {
        if !targets.iter().any(|t| &t.name == name) {
            tracing::warn!(target = %name, "unknown target requested to run; ignoring");
        }
    }

    let mut supervisor_options = options.supervisor;
    if supervisor_options.working_dir.is_none() {
        supervisor_options.working_dir = Some(layout.root().to_path_buf());
    }

    let mut dispatch = BuildDispatch {
        targets,
        toolchain,
        build: options.build,
        run: options.run.into_iter().collect(),
        supervisor: Supervisor::new(supervisor_options),
        debouncer: Debouncer::new(options.debounce),
    };

    // Without an initial pass nothing gets built up front, so run what is
    // already on disk.
    if options.initial_scan == InitialScan::Ignore {
        dispatch.start_existing();
    }

    let mut reap = tokio::time::interval(REAP_INTERVAL);
    reap.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let result = loop {
        let deadline = dispatch.debouncer.next_deadline();
        tokio::select! {
            _ = &mut shutdown => break Ok(()),
            event = rx.recv() => {
                let Some(event) = event else { break Ok(()) };
                if let Err(err) = dispatch.on_event(event).await {
                    break Err(err);
                }
            }
            _ = wait_until(deadline) => {
                if let Err(err) = dispatch.flush().await {
                    break Err(err);
                }
            }
            _ = reap.tick() => {
                dispatch.supervisor.reap();
            }
        }
    };

    dispatch.supervisor.stop_all().await;
    for session in &mut sessions {
        session.stop();
    }
    result
}

fn attach_all(
    targets: &[TargetSpec],
    scan: InitialScan,
    tx: &watch::EventSender,
) -> Result<Vec<WatchSession>, RuntimeError> {
    let mut sessions = Vec::with_capacity(targets.len());
    for target in targets {
        if !target.input_path.is_dir() {
            tracing::warn!(
                target = %target.name,
                path = %target.input_path.display(),
                "source directory missing; not watching"
            );
            continue;
        }
        sessions.push(watch::attach(
            target.name.clone(),
            &target.input_path,
            scan,
            tx.clone(),
        )?);
    }
    Ok(sessions)
}

struct BuildDispatch {
    /// Classifier order; the index is the rank used by the debouncer.
    targets: Vec<TargetSpec>,
    toolchain: Arc<dyn Toolchain>,
    build: BuildOptions,
    run: HashSet<TargetName>,
    supervisor: Supervisor,
    debouncer: Debouncer,
}

impl BuildDispatch {
    fn rank(&self, name: &TargetName) -> Option<usize> {
        self.targets.iter().position(|t| &t.name == name)
    }

    fn start_existing(&mut self) {
        for target in &self.targets {
            if !self.run.contains(&target.name) {
                continue;
            }
            if let Err(err) = self.supervisor.start(target) {
                tracing::error!(target = %target.name, error = %err, "cannot start");
            }
        }
    }

    async fn on_event(&mut self, event: WatchEvent) -> Result<(), RuntimeError> {
        let Some(rank) = self.rank(event.target()) else {
            tracing::debug!(target = %event.target(), "event for unknown target");
            return Ok(());
        };
        let target = &self.targets[rank];
        let browser = target.kind == TargetKind::Browser;

        match event {
            WatchEvent::SourceRemoved { path, .. } if !browser => {
                self.debouncer.forget(rank, &path);
                let target = target.clone();
                tokio::task::spawn_blocking(move || remove_output(&target, &path))
                    .await
                    .map_err(|e| RuntimeError::Join("remove", e.to_string()))?;
            }
            WatchEvent::SourceChanged { path, .. } | WatchEvent::SourceRemoved { path, .. } => {
                let name = target.name.clone();
                self.debouncer.push(rank, &name, browser, path, Instant::now());
            }
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), RuntimeError> {
        for batch in self.debouncer.take_ready(Instant::now()) {
            self.rebuild(batch).await?;
        }
        Ok(())
    }

    async fn rebuild(&mut self, batch: Batch) -> Result<(), RuntimeError> {
        let Some(rank) = self.rank(&batch.target) else {
            return Ok(());
        };
        let target = self.targets[rank].clone();
        let toolchain = Arc::clone(&self.toolchain);
        let minify = self.build.minify;

        let spec = target.clone();
        let result = tokio::task::spawn_blocking(move || {
            rebuild_blocking(&*toolchain, &spec, batch.paths, minify)
        })
        .await
        .map_err(|e| RuntimeError::Join("build", e.to_string()))?;
        log_result(&result);

        if self.run.contains(&target.name) {
            self.after_build(&target, &result).await;
        }
        Ok(())
    }

    /// Restart a supervised target after a successful rebuild.
    async fn after_build(&mut self, target: &TargetSpec, result: &BuildResult) {
        if !result.success {
            tracing::warn!(target = %target.name, "build failed; keeping the current process");
            return;
        }
        let running = self.supervisor.state(&target.name) == ProcessState::Running;
        if running && result.written() == 0 {
            return;
        }
        if let Err(err) = self.supervisor.restart(target).await {
            tracing::error!(target = %target.name, error = %err, "restart failed");
        }
    }
}

fn rebuild_blocking(
    toolchain: &dyn Toolchain,
    target: &TargetSpec,
    paths: Vec<PathBuf>,
    minify: bool,
) -> BuildResult {
    let started = std::time::Instant::now();
    let outcomes = if target.kind == TargetKind::Browser {
        bundle(toolchain, target, minify)
    } else {
        paths
            .iter()
            .filter(|path| path.is_file())
            .map(|path| compile_file(toolchain, target, path))
            .collect()
    };
    BuildResult::from_outcomes(target, outcomes, started)
}

fn log_result(result: &BuildResult) {
    if result.success {
        tracing::info!(
            target = %result.target,
            written = result.written(),
            elapsed_ms = result.duration.as_millis() as u64,
            "rebuilt"
        );
    } else {
        tracing::error!(
            target = %result.target,
            failed = result.failed(),
            "rebuild finished with errors"
        );
    }
}

// ---------------------------------------------------------------------------
// watch-process
// ---------------------------------------------------------------------------

/// Run one node target and restart it whenever its build output changes.
pub async fn run_process_watch(
    layout: Layout,
    target: TargetSpec,
    options: ProcessWatchOptions,
) -> Result<(), RuntimeError> {
    run_process_watch_until(layout, target, options, shutdown_signal()).await
}

/// [`run_process_watch`] with an explicit shutdown future.
pub async fn run_process_watch_until(
    layout: Layout,
    target: TargetSpec,
    options: ProcessWatchOptions,
    shutdown: impl Future<Output = ()>,
) -> Result<(), RuntimeError> {
    let mut supervisor_options = options.supervisor;
    if supervisor_options.working_dir.is_none() {
        supervisor_options.working_dir = Some(layout.root().to_path_buf());
    }
    let mut supervisor = Supervisor::new(supervisor_options);
    supervisor.start(&target)?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut session = match watch::attach(
        target.name.clone(),
        &target.output_path,
        InitialScan::Ignore,
        tx,
    ) {
        Ok(session) => session,
        Err(err) => {
            supervisor.stop_all().await;
            return Err(err);
        }
    };

    let mut debouncer = Debouncer::new(options.debounce);
    let mut reap = tokio::time::interval(REAP_INTERVAL);
    reap.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        let deadline = debouncer.next_deadline();
        tokio::select! {
            _ = &mut shutdown => break,
            event = rx.recv() => {
                match event {
                    Some(WatchEvent::SourceChanged { path, .. }) => {
                        debouncer.push(0, &target.name, false, path, Instant::now());
                    }
                    // An unlinked output never restarts the process.
                    Some(WatchEvent::SourceRemoved { path, .. }) => {
                        tracing::debug!(
                            target = %target.name,
                            path = %path.display(),
                            "output removed"
                        );
                    }
                    None => break,
                }
            }
            _ = wait_until(deadline) => {
                let batches = debouncer.take_ready(Instant::now());
                if let Some(batch) = batches.first() {
                    tracing::info!(
                        target = %target.name,
                        changed = batch.paths.len(),
                        "output changed"
                    );
                    if let Err(err) = supervisor.restart(&target).await {
                        tracing::error!(target = %target.name, error = %err, "restart failed");
                    }
                }
            }
            _ = reap.tick() => {
                supervisor.reap();
            }
        }
    }

    supervisor.stop_all().await;
    session.stop();
    Ok(())
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
