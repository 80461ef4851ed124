//! mdlive Preview - Live preview sessions
//!
//! This crate keeps rendered previews in step with documents on disk:
//! - Debounced refresh scheduling
//! - Preview sessions and the session registry
//! - Preview surfaces (local HTTP server, HTML file)
//! - File watching (optional feature)
//! - The preview event loop

pub mod event;
pub mod registry;
pub mod scheduler;
pub mod session;
pub mod surface;

#[cfg(feature = "watch")]
pub mod watcher;

use anyhow::Result;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::time::Instant;

// Re-export main types
pub use event::PreviewEvent;
pub use registry::SessionRegistry;
pub use scheduler::{RefreshScheduler, SchedulerState};
pub use session::PreviewSession;
pub use surface::{FileSurface, PreviewSurface};

#[cfg(feature = "http")]
pub use surface::HttpSurface;
#[cfg(feature = "watch")]
pub use watcher::DocumentWatcher;

/// Run the preview loop until `Shutdown` arrives or every sender is gone.
///
/// Waits for events no longer than the earliest pending refresh, so due
/// sessions are refreshed on time even when nothing else happens.
pub fn run(registry: &mut SessionRegistry, events: &Receiver<PreviewEvent>) -> Result<()> {
    loop {
        let event = match registry.next_deadline() {
            Some(deadline) => {
                let timeout = deadline.saturating_duration_since(Instant::now());
                match events.recv_timeout(timeout) {
                    Ok(event) => Some(event),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match events.recv() {
                Ok(event) => Some(event),
                Err(_) => break,
            },
        };

        match event {
            Some(PreviewEvent::DocumentChanged(path)) => {
                registry.handle_change(&path, Instant::now());
            }
            Some(PreviewEvent::WatchError(message)) => {
                log::warn!("File watcher error: {}", message);
            }
            Some(PreviewEvent::Shutdown) => {
                log::info!("Preview loop shutting down");
                return Ok(());
            }
            None => {}
        }

        registry.tick(Instant::now())?;
    }

    log::info!("Event channel closed, stopping preview loop");
    Ok(())
}
