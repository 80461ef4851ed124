//! Preview written to an HTML file on disk

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::PreviewSurface;

pub struct FileSurface {
    path: PathBuf,
    writes: u64,
}

impl FileSurface {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writes: 0,
        }
    }

    /// `notes.md` previews into `notes.preview.html` next to it
    pub fn beside(source: &Path) -> Self {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        Self::new(source.with_file_name(format!("{}.preview.html", stem)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of documents written so far
    pub fn writes(&self) -> u64 {
        self.writes
    }
}

impl PreviewSurface for FileSurface {
    fn show(&mut self, html: &str) -> Result<()> {
        fs::write(&self.path, html)
            .with_context(|| format!("Failed to write preview: {}", self.path.display()))?;
        self.writes += 1;
        log::debug!("Wrote {} bytes to {}", html.len(), self.path.display());
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beside_source() {
        let surface = FileSurface::beside(Path::new("/docs/notes.md"));
        assert_eq!(surface.path(), Path::new("/docs/notes.preview.html"));
        assert_eq!(surface.location(), "/docs/notes.preview.html");
    }

    #[test]
    fn test_show_replaces_content() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut surface = FileSurface::new(dir.path().join("out.html"));

        surface.show("<p>first</p>")?;
        surface.show("<p>second</p>")?;

        assert_eq!(fs::read_to_string(surface.path())?, "<p>second</p>");
        assert_eq!(surface.writes(), 2);
        Ok(())
    }

    #[test]
    fn test_show_into_missing_directory_fails() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut surface = FileSurface::new(dir.path().join("missing").join("out.html"));

        assert!(surface.show("<p>x</p>").is_err());
        assert_eq!(surface.writes(), 0);
        Ok(())
    }
}
