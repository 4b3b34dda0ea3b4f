//! Trailing-edge debounce of watch events, per target.
//!
//! Each target accumulates the set of paths that changed. A batch is ready
//! once the target has been quiet for the window. Ready batches come out in
//! build order, and browser batches stay queued while any node-like batch is
//! still pending, so bundles never resolve against stale transpiled output.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use conductor_core::TargetName;
use tokio::time::Instant;

/// Paths that changed for one target during a quiet window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub target: TargetName,
    pub paths: Vec<PathBuf>,
}

#[derive(Debug)]
struct Pending {
    target: TargetName,
    browser: bool,
    paths: BTreeSet<PathBuf>,
    deadline: Instant,
}

#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    /// Keyed by build rank.
    pending: BTreeMap<usize, Pending>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Record a change; pushes the target's deadline to `now + window`.
    pub fn push(
        &mut self,
        rank: usize,
        target: &TargetName,
        browser: bool,
        path: PathBuf,
        now: Instant,
    ) {
        let deadline = now + self.window;
        let entry = self.pending.entry(rank).or_insert_with(|| Pending {
            target: target.clone(),
            browser,
            paths: BTreeSet::new(),
            deadline,
        });
        entry.paths.insert(path);
        entry.deadline = deadline;
    }

    /// Drop a pending path, e.g. because its removal was already handled.
    pub fn forget(&mut self, rank: usize, path: &Path) {
        if let Some(pending) = self.pending.get_mut(&rank) {
            pending.paths.remove(path);
            if pending.paths.is_empty() {
                self.pending.remove(&rank);
            }
        }
    }

    /// When the loop should wake up next. `None` when nothing is pending.
    ///
    /// Held browser batches do not count while node-like work is pending.
    pub fn next_deadline(&self) -> Option<Instant> {
        let node_like = self
            .pending
            .values()
            .filter(|p| !p.browser)
            .map(|p| p.deadline)
            .min();
        node_like.or_else(|| self.pending.values().map(|p| p.deadline).min())
    }

    /// Remove and return every batch whose window has elapsed, in rank order.
    pub fn take_ready(&mut self, now: Instant) -> Vec<Batch> {
        let ready: Vec<usize> = self
            .pending
            .iter()
            .filter(|(_, p)| !p.browser && p.deadline <= now)
            .map(|(rank, _)| *rank)
            .collect();
        let mut batches: Vec<Batch> = ready
            .into_iter()
            .filter_map(|rank| self.pending.remove(&rank))
            .map(Pending::into_batch)
            .collect();

        if self.pending.values().any(|p| !p.browser) {
            return batches;
        }

        let ready: Vec<usize> = self
            .pending
            .iter()
            .filter(|(_, p)| p.deadline <= now)
            .map(|(rank, _)| *rank)
            .collect();
        batches.extend(
            ready
                .into_iter()
                .filter_map(|rank| self.pending.remove(&rank))
                .map(Pending::into_batch),
        );
        batches
    }
}

impl Pending {
    fn into_batch(self) -> Batch {
        Batch {
            target: self.target,
            paths: self.paths.into_iter().collect(),
        }
    }
}
