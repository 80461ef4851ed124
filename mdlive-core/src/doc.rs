//! Document model with Rope-based text storage

use anyhow::{Context, Result};
use ropey::Rope;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Identity of a previewed document: its canonical absolute path
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(PathBuf);

impl DocumentId {
    /// Wrap a path that is already canonical (e.g. one reported by the watcher)
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// A markdown document read from disk
#[derive(Clone)]
pub struct Document {
    pub id: DocumentId,
    pub rope: Rope,
    pub loaded_mtime: Option<SystemTime>,
    pub rev: u64,
}

impl Document {
    /// Load a document from a file path
    pub fn load(path: &Path) -> Result<Self> {
        // Canonicalize so watcher events and registry keys agree on identity
        let abs_path = path
            .canonicalize()
            .with_context(|| format!("Failed to canonicalize path: {}", path.display()))?;

        let content = fs::read_to_string(&abs_path)
            .with_context(|| format!("Failed to read file: {}", abs_path.display()))?;

        let mtime = fs::metadata(&abs_path).and_then(|m| m.modified()).ok();

        Ok(Self {
            id: DocumentId(abs_path),
            rope: Rope::from_str(&content),
            loaded_mtime: mtime,
            rev: 1,
        })
    }

    /// Re-read the full text from disk
    pub fn reload(&mut self) -> Result<()> {
        let path = self.id.path();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to reload file: {}", path.display()))?;

        self.rope = Rope::from_str(&content);
        self.loaded_mtime = fs::metadata(path).and_then(|m| m.modified()).ok();
        self.rev += 1;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        self.id.path()
    }

    /// Full text of the document
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Get the number of lines in the document
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }
}
