//! Sessions keyed by document identity

use anyhow::Result;
use mdlive_core::{Document, DocumentId, HtmlGenerator};
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::session::PreviewSession;
use crate::surface::PreviewSurface;

/// Every open preview, each with its own debounce timer
pub struct SessionRegistry {
    generator: HtmlGenerator,
    delay: Duration,
    sessions: HashMap<DocumentId, PreviewSession>,
}

impl SessionRegistry {
    pub fn new(generator: HtmlGenerator, delay: Duration) -> Self {
        Self {
            generator,
            delay,
            sessions: HashMap::new(),
        }
    }

    pub fn generator(&self) -> &HtmlGenerator {
        &self.generator
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Open a preview for `doc`. An existing session for the same document is replaced.
    pub fn open(
        &mut self,
        doc: Document,
        surface: Box<dyn PreviewSurface>,
    ) -> Result<&PreviewSession> {
        let id = doc.id.clone();
        // Release the old surface before the new one renders
        if self.sessions.remove(&id).is_some() {
            log::warn!("Replacing existing preview for {}", id);
        }
        let session = PreviewSession::open(doc, self.delay, surface, &self.generator)?;
        self.sessions.insert(id.clone(), session);
        Ok(&self.sessions[&id])
    }

    /// Close a preview, dropping its surface and any pending refresh
    pub fn close(&mut self, id: &DocumentId) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn get(&self, id: &DocumentId) -> Option<&PreviewSession> {
        self.sessions.get(id)
    }

    pub fn contains(&self, id: &DocumentId) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &DocumentId> {
        self.sessions.keys()
    }

    /// Route a change for `path` to its session.
    /// Returns false, with no state change, if no session tracks `path`.
    pub fn handle_change(&mut self, path: &Path, now: Instant) -> bool {
        let Some(id) = self.resolve(path) else {
            log::trace!("Ignoring change to untracked {}", path.display());
            return false;
        };
        match self.sessions.get_mut(&id) {
            Some(session) => {
                session.on_change(now);
                true
            }
            None => false,
        }
    }

    /// Refresh every session whose timer is due. Returns how many refreshed.
    pub fn tick(&mut self, now: Instant) -> Result<usize> {
        let mut fired = 0;
        for session in self.sessions.values_mut() {
            if session.tick(now, &self.generator)? {
                fired += 1;
            }
        }
        Ok(fired)
    }

    /// Earliest pending refresh across all sessions
    pub fn next_deadline(&self) -> Option<Instant> {
        self.sessions
            .values()
            .filter_map(|s| s.scheduler().deadline())
            .min()
    }

    fn resolve(&self, path: &Path) -> Option<DocumentId> {
        let direct = DocumentId::from_path(path);
        if self.sessions.contains_key(&direct) {
            return Some(direct);
        }
        // Watchers may report a non-canonical spelling of the same file
        let canonical = DocumentId::from_path(path.canonicalize().ok()?);
        self.sessions.contains_key(&canonical).then_some(canonical)
    }
}
