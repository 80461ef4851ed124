//! Markdown text to a complete preview document.

use anyhow::Result;

use crate::config::Config;
use crate::render::{MarkdownRenderer, RenderOptions};
use crate::shell::DocumentShell;

/// Renderer and shell built once and shared by previews and exports
pub struct HtmlGenerator {
    renderer: MarkdownRenderer,
    shell: DocumentShell,
}

impl Default for HtmlGenerator {
    fn default() -> Self {
        Self::new(MarkdownRenderer::new(RenderOptions::default()), DocumentShell::default())
    }
}

impl HtmlGenerator {
    pub fn new(renderer: MarkdownRenderer, shell: DocumentShell) -> Self {
        Self { renderer, shell }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            MarkdownRenderer::new(config.render),
            DocumentShell::new(config.assets.clone()),
        )
    }

    pub fn renderer(&self) -> &MarkdownRenderer {
        &self.renderer
    }

    /// Rendered body only, without the document shell
    pub fn fragment(&self, markdown: &str) -> Result<String> {
        self.renderer.render(markdown)
    }

    /// Full standalone HTML document for `markdown`
    pub fn generate(&self, markdown: &str) -> Result<String> {
        let fragment = self.renderer.render(markdown)?;
        let document = self.shell.assemble(&fragment);
        log::debug!(
            "Generated document: {} markdown bytes -> {} html bytes",
            markdown.len(),
            document.len()
        );
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_wraps_fragment() -> Result<()> {
        let generator = HtmlGenerator::default();
        let fragment = generator.fragment("# Hi")?;
        let document = generator.generate("# Hi")?;

        assert!(document.contains(&fragment));
        assert!(document.starts_with("<!DOCTYPE html>"));
        Ok(())
    }

    #[test]
    fn test_generate_is_byte_identical() -> Result<()> {
        let generator = HtmlGenerator::default();
        let source = "# Title :smile:\n\nhttps://example.com\n\n```python\nprint('x')\n```\n\n```markmap\n# a\n```\n";
        assert_eq!(generator.generate(source)?, generator.generate(source)?);
        Ok(())
    }

    #[test]
    fn test_from_config_uses_render_options() -> Result<()> {
        let mut config = Config::default();
        config.render.emoji = false;
        config.assets.title = "Custom".to_string();

        let generator = HtmlGenerator::from_config(&config);
        let document = generator.generate(":rocket:")?;
        assert!(document.contains(":rocket:"));
        assert!(document.contains("<title>Custom</title>"));
        Ok(())
    }
}
