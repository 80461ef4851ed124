//! One live preview: a document, its refresh timer and where it is shown

use anyhow::{Context, Result};
use mdlive_core::{Document, DocumentId, HtmlGenerator};
use std::time::{Duration, Instant};

use crate::scheduler::RefreshScheduler;
use crate::surface::PreviewSurface;

pub struct PreviewSession {
    doc: Document,
    scheduler: RefreshScheduler,
    surface: Box<dyn PreviewSurface>,
    refreshes: u64,
}

impl PreviewSession {
    /// Start a session and render the document right away (the first paint is not debounced)
    pub fn open(
        doc: Document,
        delay: Duration,
        surface: Box<dyn PreviewSurface>,
        generator: &HtmlGenerator,
    ) -> Result<Self> {
        let mut session = Self {
            doc,
            scheduler: RefreshScheduler::new(delay),
            surface,
            refreshes: 0,
        };
        session.render(generator)?;
        log::info!(
            "Opened preview for {} at {}",
            session.doc.id,
            session.surface.location()
        );
        Ok(session)
    }

    pub fn id(&self) -> &DocumentId {
        &self.doc.id
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn scheduler(&self) -> &RefreshScheduler {
        &self.scheduler
    }

    pub fn surface(&self) -> &dyn PreviewSurface {
        self.surface.as_ref()
    }

    /// Documents pushed to the surface, including the first paint
    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }

    /// The document changed at `now`; restart the debounce window
    pub fn on_change(&mut self, now: Instant) -> bool {
        let replaced = self.scheduler.notify(now);
        if replaced {
            log::trace!("Debounced change for {}", self.doc.id);
        }
        replaced
    }

    /// Refresh if the pending timer is due. Returns true if a refresh happened.
    pub fn tick(&mut self, now: Instant, generator: &HtmlGenerator) -> Result<bool> {
        if !self.scheduler.poll(now) {
            return Ok(false);
        }
        self.refresh(generator)?;
        Ok(true)
    }

    /// Re-read the document from disk and push a freshly generated page
    pub fn refresh(&mut self, generator: &HtmlGenerator) -> Result<()> {
        self.doc
            .reload()
            .with_context(|| format!("Failed to refresh preview for {}", self.doc.id))?;
        self.render(generator)
    }

    fn render(&mut self, generator: &HtmlGenerator) -> Result<()> {
        let html = generator.generate(&self.doc.text())?;
        self.surface.show(&html)?;
        self.refreshes += 1;
        log::debug!(
            "Rendered {} (rev {}, {} bytes)",
            self.doc.id,
            self.doc.rev,
            html.len()
        );
        Ok(())
    }
}

impl Drop for PreviewSession {
    fn drop(&mut self) {
        if self.scheduler.is_pending() {
            log::debug!("Discarding pending refresh for {}", self.doc.id);
        }
        log::info!("Closed preview for {}", self.doc.id);
    }
}
