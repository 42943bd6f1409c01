//! Markdown rendering for ghdocs.
//!
//! [`MarkdownRenderer`] turns a document body into HTML plus a table of
//! contents. Relative links between documents are rewritten from source
//! paths (`../api/index.md`) to site-relative URLs (`../api`), so the same
//! HTML works under every version prefix it is served from.
//!
//! # Example
//!
//! ```
//! use ghdocs_renderer::MarkdownRenderer;
//!
//! let result = MarkdownRenderer::new()
//!     .with_page("guides", true)
//!     .render_markdown("# Guides\n\nStart with [routing](./routing.md).");
//!
//! assert!(result.html.contains(r#"href="guides/routing""#));
//! assert_eq!(result.toc[0].id, "guides");
//! ```

mod links;
mod renderer;
mod toc;
mod util;

pub use renderer::{MarkdownRenderer, RenderResult};
pub use toc::{TocEntry, slugify};
pub use util::relative_path;
