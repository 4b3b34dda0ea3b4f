//! File watch multiplexer.
//!
//! Every watch root gets its own `notify` watcher, and every watcher feeds
//! the same unbounded queue of [`WatchEvent`]s, so the dispatch loop sees one
//! ordered stream regardless of how many targets are watched.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use conductor_build::writer::is_tmp_path;
use conductor_core::TargetName;
use notify::event::{ModifyKind, RemoveKind, RenameMode};
use notify::{recommended_watcher, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::{io_err, RuntimeError};

pub type EventSender = mpsc::UnboundedSender<WatchEvent>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    SourceChanged { target: TargetName, path: PathBuf },
    SourceRemoved { target: TargetName, path: PathBuf },
}

impl WatchEvent {
    pub fn target(&self) -> &TargetName {
        match self {
            WatchEvent::SourceChanged { target, .. } | WatchEvent::SourceRemoved { target, .. } => {
                target
            }
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            WatchEvent::SourceChanged { path, .. } | WatchEvent::SourceRemoved { path, .. } => path,
        }
    }
}

/// Whether attaching a session reports the files already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitialScan {
    /// Queue a `SourceChanged` for every existing file.
    Emit,
    /// Only report changes made after attaching.
    Ignore,
}

/// A live subscription on one target's watch root.
pub struct WatchSession {
    pub target: TargetName,
    pub root: PathBuf,
    watcher: Option<RecommendedWatcher>,
}

impl WatchSession {
    pub fn is_active(&self) -> bool {
        self.watcher.is_some()
    }

    /// Drop the underlying watcher. No further events are queued.
    pub fn stop(&mut self) {
        if self.watcher.take().is_some() {
            tracing::debug!(target = %self.target, "watch session stopped");
        }
    }
}

impl std::fmt::Debug for WatchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSession")
            .field("target", &self.target)
            .field("root", &self.root)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Start watching `root` on behalf of `target`, feeding `tx`.
pub fn attach(
    target: TargetName,
    root: &Path,
    scan: InitialScan,
    tx: EventSender,
) -> Result<WatchSession, RuntimeError> {
    // Backends report real paths (e.g. /private/var on macOS); map them back
    // onto `root` so outputs are computed from the classified input path.
    let canonical = fs::canonicalize(root).map_err(|e| io_err(root, e))?;

    let mapper = EventMapper {
        target: target.clone(),
        root: root.to_path_buf(),
        canonical,
    };
    let callback_tx = tx.clone();
    let mut watcher = recommended_watcher(move |event: notify::Result<Event>| match event {
        Ok(event) => {
            for mapped in mapper.map(&event) {
                let _ = callback_tx.send(mapped);
            }
        }
        Err(err) => tracing::warn!(error = %err, "watcher event error"),
    })?;
    watcher.watch(root, RecursiveMode::Recursive)?;
    tracing::info!(target = %target, path = %root.display(), "watching");

    if scan == InitialScan::Emit {
        for path in collect_files(root)? {
            let _ = tx.send(WatchEvent::SourceChanged {
                target: target.clone(),
                path,
            });
        }
    }

    Ok(WatchSession {
        target,
        root: root.to_path_buf(),
        watcher: Some(watcher),
    })
}

// ---------------------------------------------------------------------------
// Event mapping
// ---------------------------------------------------------------------------

struct EventMapper {
    target: TargetName,
    root: PathBuf,
    canonical: PathBuf,
}

impl EventMapper {
    fn map(&self, event: &Event) -> Vec<WatchEvent> {
        let mut out = Vec::new();
        match &event.kind {
            EventKind::Create(_) | EventKind::Modify(ModifyKind::Data(_)) => {
                self.push_changed(&mut out, event.paths.iter());
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                self.push_removed(&mut out, event.paths.iter());
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                self.push_changed(&mut out, event.paths.iter());
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                self.push_removed(&mut out, event.paths.iter().take(1));
                self.push_changed(&mut out, event.paths.iter().skip(1));
            }
            EventKind::Modify(_) => {
                for path in &event.paths {
                    if path.exists() {
                        self.push_changed(&mut out, std::iter::once(path));
                    } else {
                        self.push_removed(&mut out, std::iter::once(path));
                    }
                }
            }
            EventKind::Remove(RemoveKind::Folder) => {}
            EventKind::Remove(_) => self.push_removed(&mut out, event.paths.iter()),
            EventKind::Access(_) | EventKind::Any | EventKind::Other => {}
        }
        out
    }

    fn push_changed<'a>(
        &self,
        out: &mut Vec<WatchEvent>,
        paths: impl Iterator<Item = &'a PathBuf>,
    ) {
        for path in paths {
            if path.is_dir() {
                // A folder moved into place arrives as one event; report its files.
                match collect_files(path) {
                    Ok(files) => self.push_changed(out, files.iter()),
                    Err(err) => tracing::warn!(error = %err, "cannot scan moved folder"),
                }
                continue;
            }
            if let Some(path) = self.localize(path) {
                out.push(WatchEvent::SourceChanged {
                    target: self.target.clone(),
                    path,
                });
            }
        }
    }

    fn push_removed<'a>(
        &self,
        out: &mut Vec<WatchEvent>,
        paths: impl Iterator<Item = &'a PathBuf>,
    ) {
        for path in paths {
            if let Some(path) = self.localize(path) {
                out.push(WatchEvent::SourceRemoved {
                    target: self.target.clone(),
                    path,
                });
            }
        }
    }

    /// Rebase onto `root`; drops foreign paths and in-flight temporaries.
    fn localize(&self, path: &Path) -> Option<PathBuf> {
        if is_tmp_path(path) {
            return None;
        }
        let relative = path
            .strip_prefix(&self.canonical)
            .or_else(|_| path.strip_prefix(&self.root))
            .ok()?;
        if relative.as_os_str().is_empty() {
            return None;
        }
        Some(self.root.join(relative))
    }
}

/// Every file below `root`, sorted, skipping temporaries.
fn collect_files(root: &Path) -> Result<Vec<PathBuf>, RuntimeError> {
    let mut dirs = vec![root.to_path_buf()];
    let mut files = Vec::new();
    while let Some(current) = dirs.pop() {
        let entries = match fs::read_dir(&current) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => continue,
            Err(err) => return Err(io_err(&current, err)),
        };
        for entry in entries {
            let entry = entry.map_err(|e| io_err(&current, e))?;
            let ty = entry.file_type().map_err(|e| io_err(entry.path(), e))?;
            if ty.is_dir() {
                dirs.push(entry.path());
            } else if !is_tmp_path(&entry.path()) {
                files.push(entry.path());
            }
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange};
    use tempfile::TempDir;

    fn mapper(root: &Path) -> EventMapper {
        EventMapper {
            target: TargetName::from("server"),
            root: root.to_path_buf(),
            canonical: fs::canonicalize(root).unwrap(),
        }
    }

    fn event(kind: EventKind, paths: &[PathBuf]) -> Event {
        let mut event = Event::new(kind);
        for path in paths {
            event = event.add_path(path.clone());
        }
        event
    }

    #[test]
    fn create_and_modify_map_to_changed() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("index.js");
        fs::write(&file, "x").unwrap();
        let mapper = mapper(tmp.path());

        let created = mapper.map(&event(EventKind::Create(CreateKind::File), &[file.clone()]));
        let modified = mapper.map(&event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &[file.clone()],
        ));

        let expected = vec![WatchEvent::SourceChanged {
            target: TargetName::from("server"),
            path: file,
        }];
        assert_eq!(created, expected);
        assert_eq!(modified, expected);
    }

    #[test]
    fn remove_maps_to_removed() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("gone.js");
        let mapped =
            mapper(tmp.path()).map(&event(EventKind::Remove(RemoveKind::File), &[file.clone()]));
        assert_eq!(
            mapped,
            vec![WatchEvent::SourceRemoved {
                target: TargetName::from("server"),
                path: file,
            }]
        );
    }

    #[test]
    fn directories_access_and_temporaries_are_dropped() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("lib");
        fs::create_dir(&dir).unwrap();
        let mapper = mapper(tmp.path());

        assert!(mapper
            .map(&event(EventKind::Create(CreateKind::Folder), &[dir.clone()]))
            .is_empty());
        assert!(mapper
            .map(&event(EventKind::Remove(RemoveKind::Folder), &[dir]))
            .is_empty());
        assert!(mapper
            .map(&event(
                EventKind::Access(AccessKind::Any),
                &[tmp.path().join("a.js")]
            ))
            .is_empty());
        assert!(mapper
            .map(&event(
                EventKind::Create(CreateKind::File),
                &[tmp.path().join("a.js.conductor.tmp")]
            ))
            .is_empty());
    }

    #[test]
    fn rename_reports_both_sides() {
        let tmp = TempDir::new().unwrap();
        let from = tmp.path().join("old.js");
        let to = tmp.path().join("new.js");
        fs::write(&to, "x").unwrap();

        let mapped = mapper(tmp.path()).map(&event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &[from.clone(), to.clone()],
        ));

        assert_eq!(
            mapped,
            vec![
                WatchEvent::SourceRemoved {
                    target: TargetName::from("server"),
                    path: from,
                },
                WatchEvent::SourceChanged {
                    target: TargetName::from("server"),
                    path: to,
                },
            ]
        );
    }

    #[test]
    fn folder_renamed_into_place_reports_its_files() {
        let tmp = TempDir::new().unwrap();
        let from = tmp.path().join("old");
        let to = tmp.path().join("lib");
        fs::create_dir_all(to.join("nested")).unwrap();
        fs::write(to.join("a.js"), "a").unwrap();
        fs::write(to.join("nested/b.json"), "{}").unwrap();

        let mapped = mapper(tmp.path()).map(&event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &[from.clone(), to.clone()],
        ));

        let server = TargetName::from("server");
        assert_eq!(
            mapped,
            vec![
                WatchEvent::SourceRemoved {
                    target: server.clone(),
                    path: from,
                },
                WatchEvent::SourceChanged {
                    target: server.clone(),
                    path: to.join("a.js"),
                },
                WatchEvent::SourceChanged {
                    target: server,
                    path: to.join("nested/b.json"),
                },
            ]
        );
    }

    #[test]
    fn paths_outside_the_root_are_dropped() {
        let tmp = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        let file = other.path().join("a.js");
        fs::write(&file, "x").unwrap();
        assert!(mapper(tmp.path())
            .map(&event(EventKind::Create(CreateKind::File), &[file]))
            .is_empty());
    }

    #[tokio::test]
    async fn initial_scan_emits_every_file_in_order() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("lib")).unwrap();
        fs::write(tmp.path().join("index.js"), "a").unwrap();
        fs::write(tmp.path().join("lib/util.js"), "b").unwrap();
        fs::write(tmp.path().join("lib/util.js.conductor.tmp"), "c").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let session = attach(TargetName::from("server"), tmp.path(), InitialScan::Emit, tx)
            .expect("attach");
        assert!(session.is_active());

        let first = rx.recv().await.expect("first event");
        let second = rx.recv().await.expect("second event");
        assert_eq!(first.path(), tmp.path().join("index.js"));
        assert_eq!(second.path(), tmp.path().join("lib/util.js"));
        assert!(matches!(first, WatchEvent::SourceChanged { .. }));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn ignore_scan_queues_nothing_and_stop_deactivates() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("index.js"), "a").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = attach(TargetName::from("game"), tmp.path(), InitialScan::Ignore, tx)
            .expect("attach");

        assert!(rx.try_recv().is_err());
        session.stop();
        assert!(!session.is_active());
    }
}
