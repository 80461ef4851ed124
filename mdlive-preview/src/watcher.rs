//! File watching for external changes

use anyhow::{Context, Result};
use crossbeam_channel::Sender;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::event::PreviewEvent;

/// Forwards file-system changes near watched documents to the preview loop
pub struct DocumentWatcher {
    watcher: RecommendedWatcher,
    watched_dirs: HashSet<PathBuf>,
}

impl DocumentWatcher {
    /// Create a watcher that sends events on `events`
    pub fn new(events: Sender<PreviewEvent>) -> Result<Self> {
        let watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    // Only care about modification events
                    if matches!(
                        event.kind,
                        notify::EventKind::Modify(_) | notify::EventKind::Create(_)
                    ) {
                        for path in event.paths {
                            let _ = events.send(PreviewEvent::DocumentChanged(path));
                        }
                    }
                }
                Err(e) => {
                    let _ = events.send(PreviewEvent::WatchError(e.to_string()));
                }
            }
        })
        .context("Failed to create file watcher")?;

        Ok(Self {
            watcher,
            watched_dirs: HashSet::new(),
        })
    }

    /// Start watching `path`.
    ///
    /// The parent directory is watched rather than the file itself, so editors
    /// that save by writing a new file and renaming it over the old one are seen.
    pub fn watch(&mut self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        if self.watched_dirs.contains(parent) {
            return Ok(());
        }

        self.watcher
            .watch(parent, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch directory: {}", parent.display()))?;
        self.watched_dirs.insert(parent.to_path_buf());
        log::debug!("Watching {} for changes to {}", parent.display(), path.display());

        Ok(())
    }

    pub fn watched_dirs(&self) -> impl Iterator<Item = &Path> {
        self.watched_dirs.iter().map(PathBuf::as_path)
    }
}
