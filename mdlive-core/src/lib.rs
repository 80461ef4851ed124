//! mdlive Core - Rendering, document model, and configuration
//!
//! This crate contains the core logic for mdlive, independent of how previews are shown:
//! - Markdown rendering with diagram fences (mermaid, markmap)
//! - Document shell assembly
//! - Document model with Rope-based text storage
//! - Configuration management
//! - PDF export through a headless browser (optional feature)

pub mod config;
pub mod doc;
pub mod generator;
pub mod render;
pub mod shell;

#[cfg(feature = "pdf")]
pub mod export;

// Re-export commonly used types
pub use config::Config;
pub use doc::{Document, DocumentId};
pub use generator::HtmlGenerator;
pub use render::{MarkdownRenderer, RenderOptions};
pub use shell::DocumentShell;
