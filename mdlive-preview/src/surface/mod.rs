//! Places a rendered document can be shown
//!
//! A surface only ever receives complete documents: every `show` replaces
//! what was displayed before.

use anyhow::Result;

mod file;
#[cfg(feature = "http")]
mod http;

pub use file::FileSurface;
#[cfg(feature = "http")]
pub use http::HttpSurface;

pub trait PreviewSurface {
    /// Replace the displayed document with `html`
    fn show(&mut self, html: &str) -> Result<()>;

    /// Where a browser can load the document from (URL or file path)
    fn location(&self) -> String;
}

/// Open the surface's location in the system browser
#[cfg(feature = "http")]
pub fn open_in_browser(surface: &dyn PreviewSurface) -> Result<()> {
    use anyhow::Context;

    let location = surface.location();
    open::that(&location).with_context(|| format!("Failed to open browser at {}", location))?;
    log::info!("Opened {} in browser", location);
    Ok(())
}
