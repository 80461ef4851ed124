//! Standalone HTML document around a rendered fragment.

use crate::config::AssetConfig;
use crate::render::escape_html;

/// Static page wrapper: metadata, stylesheets and diagram scripts.
#[derive(Debug, Clone, Default)]
pub struct DocumentShell {
    assets: AssetConfig,
}

impl DocumentShell {
    pub fn new(assets: AssetConfig) -> Self {
        Self { assets }
    }

    pub fn assets(&self) -> &AssetConfig {
        &self.assets
    }

    /// Embed an HTML fragment in the page. The fragment is trusted and
    /// inserted as-is.
    pub fn assemble(&self, fragment: &str) -> String {
        let assets = &self.assets;
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <link rel="stylesheet" href="{markdown_css}">
    <link rel="stylesheet" href="{highlight_css}">
</head>
<body>
    <div class="markdown-body">
{fragment}
    </div>
    <script src="{mermaid_js}"></script>
    <script src="{markmap_js}"></script>
    <script>
        mermaid.initialize({{ startOnLoad: true }});
    </script>
</body>
</html>
"#,
            title = escape_html(&assets.title),
            markdown_css = escape_html(&assets.markdown_css),
            highlight_css = escape_html(&assets.highlight_css),
            mermaid_js = escape_html(&assets.mermaid_js),
            markmap_js = escape_html(&assets.markmap_js),
            fragment = fragment,
        )
    }
}
