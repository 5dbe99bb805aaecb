use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::io::paths::RESERVED_DIR;

/// Events sent from the directory watcher to the TUI event loop.
#[derive(Debug)]
pub enum TreeEvent {
    /// Topic or workspace directories appeared, vanished or were renamed.
    Changed(Vec<PathBuf>),
}

/// Watches the root and every topic directory, one level deep each, so
/// changes made outside the tool can trigger a reload.
pub struct TreeWatcher {
    watcher: RecommendedWatcher,
    rx: mpsc::Receiver<TreeEvent>,
    watched: BTreeSet<PathBuf>,
}

impl TreeWatcher {
    pub fn start(root: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let reserved = root.join(RESERVED_DIR);

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let event = match result {
                    Ok(e) => e,
                    Err(_) => return,
                };

                // Content edits inside a workspace are not our business
                match event.kind {
                    EventKind::Create(_) | EventKind::Remove(_) => {}
                    EventKind::Modify(notify::event::ModifyKind::Name(_)) => {}
                    _ => return,
                }

                let relevant: Vec<PathBuf> = event
                    .paths
                    .into_iter()
                    .filter(|p| !p.starts_with(&reserved))
                    .collect();

                if !relevant.is_empty() {
                    let _ = tx.send(TreeEvent::Changed(relevant));
                }
            },
            Config::default(),
        )?;

        watcher.watch(root, RecursiveMode::NonRecursive)?;
        let mut watched = BTreeSet::new();
        watched.insert(root.to_path_buf());
        Ok(TreeWatcher {
            watcher,
            rx,
            watched,
        })
    }

    /// Watch exactly the root plus `topics`, dropping stale topic watches.
    pub fn rewatch(&mut self, root: &Path, topics: &[PathBuf]) {
        let wanted: BTreeSet<PathBuf> = topics
            .iter()
            .cloned()
            .chain(std::iter::once(root.to_path_buf()))
            .collect();
        for stale in self.watched.difference(&wanted) {
            let _ = self.watcher.unwatch(stale);
        }
        for fresh in wanted.difference(&self.watched) {
            if let Err(e) = self.watcher.watch(fresh, RecursiveMode::NonRecursive) {
                tracing::debug!(path = %fresh.display(), error = %e, "could not watch directory");
            }
        }
        self.watched = wanted;
    }

    /// Non-blocking poll for pending events.
    /// Returns all queued events (may be empty).
    pub fn poll(&self) -> Vec<TreeEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.rx.try_recv() {
            events.push(evt);
        }
        events
    }
}
