//! Markdown to HTML rendering.
//!
//! Wraps pulldown-cmark with the extensions the preview relies on:
//! - raw HTML pass-through
//! - automatic linking of bare URLs and e-mail addresses
//! - typographic replacements (smart quotes, dashes, (c), +-, ...), never
//!   inside detected links
//! - emoji shortcodes (`:rocket:`) and emoticon shortcuts (`:)`)
//! - syntax highlighting of fenced code blocks
//!
//! Fenced blocks tagged `mermaid` or `markmap` are not highlighted. They are
//! emitted as raw `<pre class="...">` placeholders for the diagram scripts
//! loaded by the document shell.

mod emoji;
mod highlight;
mod linkify;
mod typography;

pub use highlight::Highlighter;

use anyhow::Result;
use linkify::Segment;
use pulldown_cmark::{CodeBlockKind, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd, TextMergeStream};
use serde::{Deserialize, Serialize};

/// Fence language rendered by the flowchart/sequence diagram script.
pub const MERMAID_TAG: &str = "mermaid";
/// Fence language rendered by the mind map script.
pub const MARKMAP_TAG: &str = "markmap";

/// Converter extensions. Everything is enabled by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Pass raw HTML in the source through unescaped
    pub html: bool,
    /// Turn bare URLs and e-mail addresses into links
    pub linkify: bool,
    /// Smart quotes, dashes and symbol replacements
    pub typographer: bool,
    /// Expand `:shortcode:` and emoticon shortcuts
    pub emoji: bool,
    /// Syntax-highlight fenced code blocks
    pub highlight: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            html: true,
            linkify: true,
            typographer: true,
            emoji: true,
            highlight: true,
        }
    }
}

impl RenderOptions {
    fn to_pulldown_options(self) -> Options {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options
    }
}

/// First whitespace-delimited token of a fence info string.
pub fn language_tag(info: &str) -> &str {
    info.split_whitespace().next().unwrap_or("")
}

struct FencedBlock {
    lang: String,
    code: String,
}

/// Markdown converter configured once and reused for every render.
pub struct MarkdownRenderer {
    options: RenderOptions,
    highlighter: Highlighter,
}

impl MarkdownRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            highlighter: Highlighter::new(),
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render markdown text to an HTML fragment.
    ///
    /// ```
    /// use mdlive_core::render::{MarkdownRenderer, RenderOptions};
    ///
    /// let renderer = MarkdownRenderer::new(RenderOptions::default());
    /// let html = renderer.render("```mermaid\ngraph TD; A-->B;\n```").unwrap();
    /// assert!(html.contains(r#"<pre class="mermaid">graph TD; A-->B;</pre>"#));
    /// ```
    pub fn render(&self, markdown: &str) -> Result<String> {
        let parser = TextMergeStream::new(Parser::new_ext(
            markdown,
            self.options.to_pulldown_options(),
        ));

        let mut events: Vec<Event> = Vec::new();
        let mut fence: Option<FencedBlock> = None;
        let mut in_code = false;
        // Links and images: never linkify their text
        let mut link_depth: usize = 0;
        // Last character of text seen in the current block
        let mut prev_char: Option<char> = None;

        for event in parser {
            match &event {
                Event::Start(tag) if !is_inline_tag(tag) => prev_char = None,
                Event::End(tag) if !is_inline_end(tag) => prev_char = None,
                Event::Code(code) => prev_char = code.chars().next_back().or(prev_char),
                Event::SoftBreak | Event::HardBreak => prev_char = Some('\n'),
                _ => {}
            }

            match event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                    fence = Some(FencedBlock {
                        lang: language_tag(&info).to_string(),
                        code: String::new(),
                    });
                }
                Event::Start(Tag::CodeBlock(kind)) => {
                    in_code = true;
                    events.push(Event::Start(Tag::CodeBlock(kind)));
                }
                Event::End(TagEnd::CodeBlock) => match fence.take() {
                    Some(block) => {
                        events.push(Event::Html(CowStr::from(self.render_fence(&block)?)));
                    }
                    None => {
                        in_code = false;
                        events.push(Event::End(TagEnd::CodeBlock));
                    }
                },
                Event::Text(text) => {
                    if let Some(block) = fence.as_mut() {
                        block.code.push_str(&text);
                    } else if in_code {
                        events.push(Event::Text(text));
                    } else {
                        let last = text.chars().next_back().or(prev_char);
                        self.push_text(text, link_depth > 0, prev_char, &mut events);
                        prev_char = last;
                    }
                }
                event @ (Event::Start(Tag::Link { .. }) | Event::Start(Tag::Image { .. })) => {
                    link_depth += 1;
                    events.push(event);
                }
                event @ (Event::End(TagEnd::Link) | Event::End(TagEnd::Image)) => {
                    link_depth = link_depth.saturating_sub(1);
                    events.push(event);
                }
                Event::Html(html) | Event::InlineHtml(html) if !self.options.html => {
                    events.push(Event::Text(html));
                }
                Event::InlineHtml(html) => {
                    link_depth = track_raw_anchor(&html, link_depth);
                    events.push(Event::InlineHtml(html));
                }
                other => events.push(other),
            }
        }

        let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
        pulldown_cmark::html::push_html(&mut html_output, events.into_iter());
        Ok(html_output)
    }

    fn render_fence(&self, block: &FencedBlock) -> Result<String> {
        match block.lang.as_str() {
            MERMAID_TAG => Ok(format!("<pre class=\"mermaid\">{}</pre>\n", block.code.trim())),
            MARKMAP_TAG => Ok(format!("<pre class=\"markmap\">{}</pre>\n", block.code.trim())),
            lang => self.render_code(lang, &block.code),
        }
    }

    /// Default fence rendering: `<pre><code class="hljs language-x">`
    fn render_code(&self, lang: &str, code: &str) -> Result<String> {
        let highlighted = if self.options.highlight {
            self.highlighter.highlight(lang, code)?
        } else {
            None
        };
        let body = highlighted.unwrap_or_else(|| escape_html(code));

        if lang.is_empty() {
            Ok(format!("<pre><code class=\"hljs\">{body}</code></pre>\n"))
        } else {
            Ok(format!(
                "<pre><code class=\"hljs language-{}\">{body}</code></pre>\n",
                escape_html(lang)
            ))
        }
    }

    /// Link detection runs on the raw text, so replacements never reach a URL
    fn push_text<'a>(
        &self,
        text: CowStr<'a>,
        in_link: bool,
        before: Option<char>,
        events: &mut Vec<Event<'a>>,
    ) {
        if !self.options.linkify || in_link {
            events.push(Event::Text(self.decorate(text, before)));
            return;
        }

        let mut prev = before;
        for segment in linkify::split(&text) {
            match segment {
                Segment::Text(plain) => {
                    let decorated = self.decorate(CowStr::from(plain.to_string()), prev);
                    events.push(Event::Text(decorated));
                    prev = plain.chars().next_back().or(prev);
                }
                Segment::Url { text, href } => {
                    push_link(events, LinkType::Autolink, href, text.to_string());
                    prev = text.chars().next_back();
                }
                Segment::Email(address) => {
                    // The HTML writer adds the mailto: scheme for e-mail links
                    push_link(events, LinkType::Email, address.to_string(), address.to_string());
                    prev = address.chars().next_back();
                }
            }
        }
    }

    /// Apply emoji expansion and typographic replacements to plain text
    fn decorate<'a>(&self, text: CowStr<'a>, before: Option<char>) -> CowStr<'a> {
        if !self.options.typographer && !self.options.emoji {
            return text;
        }

        let mut owned = text.into_string();
        // Emoticons first: `:'(` must not lose its quote to the typographer
        if self.options.emoji {
            owned = emoji::expand(&owned).into_owned();
        }
        if self.options.typographer {
            owned = typography::replace(&owned, before).into_owned();
        }
        CowStr::from(owned)
    }
}

fn push_link<'a>(events: &mut Vec<Event<'a>>, link_type: LinkType, href: String, text: String) {
    events.push(Event::Start(Tag::Link {
        link_type,
        dest_url: CowStr::from(href),
        title: CowStr::Borrowed(""),
        id: CowStr::Borrowed(""),
    }));
    events.push(Event::Text(CowStr::from(text)));
    events.push(Event::End(TagEnd::Link));
}

fn is_inline_tag(tag: &Tag) -> bool {
    matches!(
        tag,
        Tag::Emphasis | Tag::Strong | Tag::Strikethrough | Tag::Link { .. } | Tag::Image { .. }
    )
}

fn is_inline_end(tag: &TagEnd) -> bool {
    matches!(
        tag,
        TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link | TagEnd::Image
    )
}

/// Follow raw `<a ...>` / `</a>` tags so their text is treated as link text
fn track_raw_anchor(html: &str, depth: usize) -> usize {
    let tag = html.trim_start().to_ascii_lowercase();
    if tag.starts_with("</a") {
        depth.saturating_sub(1)
    } else if tag.starts_with("<a ") || tag.starts_with("<a>") {
        depth + 1
    } else {
        depth
    }
}

/// Escape text for use in HTML content and quoted attributes.
///
/// Same rules as the HTML writer uses for attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    // Writing into a String cannot fail
    let _ = pulldown_cmark_escape::escape_html(&mut escaped, text);
    escaped
}
