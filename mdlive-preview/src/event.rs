//! Event types consumed by the preview loop

use std::path::PathBuf;

/// Preview loop events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewEvent {
    /// A file on disk changed (not necessarily a tracked document)
    DocumentChanged(PathBuf),
    /// The file watcher reported an error
    WatchError(String),
    /// Stop the loop
    Shutdown,
}
