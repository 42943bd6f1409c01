//! Markdown renderer.

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html};

use crate::links::{LinkBase, resolve_link};
use crate::toc::{AnchorIds, TocEntry};
use crate::util::heading_level_to_num;

/// Result of rendering markdown.
#[derive(Clone, Debug)]
pub struct RenderResult {
    /// Rendered HTML content.
    pub html: String,
    /// Table of contents entries, in document order.
    pub toc: Vec<TocEntry>,
}

/// Markdown to HTML renderer.
///
/// Every heading gets a unique anchor id. With a page set via
/// [`with_page`](Self::with_page), relative document links are rewritten to
/// site-relative URLs.
///
/// ```
/// use ghdocs_renderer::MarkdownRenderer;
///
/// let result = MarkdownRenderer::new()
///     .with_page("guides/routing", false)
///     .render_markdown("# Routing\n\nSee [loaders](./data-loading.md).");
///
/// assert!(result.html.contains(r#"<h1 id="routing">"#));
/// assert!(result.html.contains(r#"href="data-loading""#));
/// ```
#[derive(Clone, Debug)]
pub struct MarkdownRenderer {
    base: Option<LinkBase>,
    gfm: bool,
}

impl MarkdownRenderer {
    /// Create a new renderer with GFM enabled by default.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: None,
            gfm: true,
        }
    }

    /// Set the page being rendered, enabling link rewriting.
    ///
    /// `is_index` marks `index.md` sources, which are served at their
    /// directory's slug.
    #[must_use]
    pub fn with_page(mut self, slug: &str, is_index: bool) -> Self {
        self.base = Some(LinkBase::new(slug, is_index));
        self
    }

    /// Enable or disable GitHub Flavored Markdown features.
    ///
    /// GFM is enabled by default. When enabled, the parser supports:
    /// - Tables
    /// - Strikethrough (`~~text~~`)
    /// - Task lists (`- [ ] item`)
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Get parser options based on GFM configuration.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        let base = Options::ENABLE_HEADING_ATTRIBUTES;
        if self.gfm {
            base | Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_GFM
        } else {
            base
        }
    }

    /// Render markdown text.
    #[must_use]
    pub fn render_markdown(&self, markdown: &str) -> RenderResult {
        let mut events: Vec<Event<'_>> = Parser::new_ext(markdown, self.parser_options())
            .map(|event| self.rewrite_link(event))
            .collect();

        let toc = assign_heading_ids(&mut events);

        let mut output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut output, events.into_iter());

        RenderResult { html: output, toc }
    }

    fn rewrite_link<'a>(&self, event: Event<'a>) -> Event<'a> {
        let Some(base) = &self.base else {
            return event;
        };
        match event {
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) => {
                let dest_url = resolve_link(&dest_url, base).map_or(dest_url, CowStr::from);
                Event::Start(Tag::Link {
                    link_type,
                    dest_url,
                    title,
                    id,
                })
            }
            other => other,
        }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain text up to the first heading end tag.
fn heading_text(events: &[Event<'_>]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::End(TagEnd::Heading(_)) => break,
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            _ => {}
        }
    }
    text.trim().to_owned()
}

/// Give every heading a unique `id` and collect the table of contents.
fn assign_heading_ids(events: &mut [Event<'_>]) -> Vec<TocEntry> {
    let mut ids = AnchorIds::default();
    let mut toc = Vec::new();

    for idx in 0..events.len() {
        let (level, explicit) = match &events[idx] {
            Event::Start(Tag::Heading { level, id, .. }) => {
                (*level, id.as_deref().map(str::to_owned))
            }
            _ => continue,
        };

        let title = heading_text(&events[idx + 1..]);
        let anchor = ids.claim(explicit.as_deref(), &title);

        if let Event::Start(Tag::Heading { id, .. }) = &mut events[idx] {
            *id = Some(CowStr::from(anchor.clone()));
        }

        toc.push(TocEntry {
            level: heading_level_to_num(level),
            title,
            id: anchor,
        });
    }

    toc
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn render(markdown: &str) -> RenderResult {
        MarkdownRenderer::new().render_markdown(markdown)
    }

    #[test]
    fn test_basic_html() {
        let result = render("Hello **world**");
        assert_eq!(result.html, "<p>Hello <strong>world</strong></p>\n");
        assert!(result.toc.is_empty());
    }

    #[test]
    fn test_heading_ids_and_toc() {
        let result = render("# Routing\n\n## Nested `Routes`\n\n## Nested Routes\n");

        assert!(result.html.contains(r#"<h1 id="routing">Routing</h1>"#));
        assert!(result.html.contains(r#"<h2 id="nested-routes">"#));
        assert!(result.html.contains(r#"<h2 id="nested-routes-1">"#));
        assert_eq!(
            result.toc,
            vec![
                TocEntry {
                    level: 1,
                    title: "Routing".to_owned(),
                    id: "routing".to_owned(),
                },
                TocEntry {
                    level: 2,
                    title: "Nested Routes".to_owned(),
                    id: "nested-routes".to_owned(),
                },
                TocEntry {
                    level: 2,
                    title: "Nested Routes".to_owned(),
                    id: "nested-routes-1".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn test_explicit_heading_id() {
        let result = render("## Loaders {#data-loaders}\n");
        assert!(result.html.contains(r#"<h2 id="data-loaders">Loaders</h2>"#));
        assert_eq!(result.toc[0].id, "data-loaders");
    }

    #[test]
    fn test_links_untouched_without_page() {
        let result = render("[a](./other.md)");
        assert!(result.html.contains(r#"href="./other.md""#));
    }

    #[test]
    fn test_links_rewritten_with_page() {
        let result = MarkdownRenderer::new()
            .with_page("guides/routing", false)
            .render_markdown(
                "[a](../api/index.md) [b](https://github.com) [c](#top) [d](./img.png)",
            );

        assert!(result.html.contains(r#"href="../api""#));
        assert!(result.html.contains(r#"href="https://github.com""#));
        assert!(result.html.contains(r##"href="#top""##));
        assert!(result.html.contains(r#"href="./img.png""#));
    }

    #[test]
    fn test_gfm_table() {
        let markdown = "| a | b |\n|---|---|\n| 1 | 2 |\n";
        assert!(render(markdown).html.contains("<table>"));
        let plain = MarkdownRenderer::new().with_gfm(false).render_markdown(markdown);
        assert!(!plain.html.contains("<table>"));
    }

    #[test]
    fn test_empty_input() {
        let result = render("");
        assert_eq!(result.html, "");
        assert!(result.toc.is_empty());
    }
}
