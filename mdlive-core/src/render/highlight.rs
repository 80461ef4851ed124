//! Syntax highlighting of fenced code blocks.
//!
//! Token spans carry `hljs-` prefixed scope classes (`hljs-keyword`,
//! `hljs-string`, `hljs-comment`, ...) so the highlight.js theme linked from
//! the document shell styles them.

use anyhow::{Context, Result};
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hljs-" };

pub struct Highlighter {
    syntax_set: SyntaxSet,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter {
    /// Load the bundled syntax definitions
    pub fn new() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
        }
    }

    /// Whether a language tag maps to a known syntax
    pub fn supports(&self, lang: &str) -> bool {
        !lang.is_empty() && self.syntax_set.find_syntax_by_token(lang).is_some()
    }

    /// Highlight `code` as `lang`, returning `None` for unknown languages
    pub fn highlight(&self, lang: &str, code: &str) -> Result<Option<String>> {
        if lang.is_empty() {
            return Ok(None);
        }
        let Some(syntax) = self.syntax_set.find_syntax_by_token(lang) else {
            log::trace!("No syntax for fence language {lang:?}");
            return Ok(None);
        };

        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntax_set, CLASS_STYLE);
        for line in LinesWithEndings::from(code) {
            generator
                .parse_html_for_line_which_includes_newline(line)
                .with_context(|| format!("Failed to highlight {lang} code block"))?;
        }
        Ok(Some(generator.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supports_common_languages() {
        let highlighter = Highlighter::new();
        assert!(highlighter.supports("rust"));
        assert!(highlighter.supports("js"));
        assert!(highlighter.supports("python"));
        assert!(!highlighter.supports(""));
        assert!(!highlighter.supports("definitely-not-a-language"));
    }

    #[test]
    fn test_highlight_emits_prefixed_classes() -> Result<()> {
        let highlighter = Highlighter::new();
        let html = highlighter
            .highlight("rust", "fn main() { let x = \"<b>\"; }\n")?
            .expect("rust is bundled");
        assert!(html.contains("hljs-"));
        assert!(html.contains("&lt;b&gt;"));
        assert!(!html.contains("<b>"));
        Ok(())
    }

    #[test]
    fn test_unknown_language_returns_none() -> Result<()> {
        let highlighter = Highlighter::new();
        assert!(highlighter.highlight("nosuchlang", "x\n")?.is_none());
        assert!(highlighter.highlight("", "x\n")?.is_none());
        Ok(())
    }
}
