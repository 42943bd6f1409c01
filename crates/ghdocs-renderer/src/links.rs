//! Source-relative link rewriting.
//!
//! On the source host, `[x](../api/index.md)` resolves by filesystem
//! adjacency. On the site the same page lives at a slug without extension
//! or `index` segment. Links are rewritten to site-relative URLs so rendered
//! HTML stays valid under any version prefix.

use crate::util::relative_path;

/// Where the document being rendered lives.
#[derive(Clone, Debug)]
pub(crate) struct LinkBase {
    /// Site slug of the page (the URL the browser resolves against).
    page: String,
    /// Directory of the source file, relative to the docs root.
    source_dir: String,
}

impl LinkBase {
    /// `is_index` is true for `index.md` documents, whose source directory is
    /// the slug itself rather than its parent.
    pub(crate) fn new(slug: &str, is_index: bool) -> Self {
        let slug = slug.trim_matches('/');
        let source_dir = if is_index {
            slug.to_owned()
        } else {
            slug.rsplit_once('/')
                .map_or_else(String::new, |(dir, _)| dir.to_owned())
        };
        Self {
            page: slug.to_owned(),
            source_dir,
        }
    }
}

fn has_scheme(url: &str) -> bool {
    url.split_once(':').is_some_and(|(scheme, _)| {
        !scheme.is_empty()
            && !scheme.contains('/')
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Rewrite a link target, or `None` to leave it unchanged.
///
/// Only relative links to documents are rewritten: targets ending in `.md`
/// or without any extension. External URLs, fragment-only links, absolute
/// paths and assets (`./diagram.png`) are left alone.
#[allow(clippy::case_sensitive_file_extension_comparisons)]
pub(crate) fn resolve_link(url: &str, base: &LinkBase) -> Option<String> {
    if url.is_empty() || url.starts_with('#') || url.starts_with('/') || has_scheme(url) {
        return None;
    }

    let (path, fragment) = match url.find('#') {
        Some(pos) => (&url[..pos], &url[pos..]),
        None => (url, ""),
    };

    let last = path.rsplit('/').next().unwrap_or(path);
    if !last.ends_with(".md") && last.contains('.') && last != "." && last != ".." {
        return None;
    }

    let resolved = resolve_relative_path(path, &base.source_dir);
    let target = strip_document_suffix(&resolved);
    let relative = relative_path(&base.page, target);

    Some(format!("{relative}{fragment}"))
}

/// Strip `.md`, a trailing `index` segment and trailing slashes.
fn strip_document_suffix(path: &str) -> &str {
    let path = path.strip_suffix(".md").unwrap_or(path);
    let path = if path == "index" {
        ""
    } else {
        path.strip_suffix("/index").unwrap_or(path)
    };
    path.trim_end_matches('/')
}

/// Resolve a relative path against a base directory.
///
/// Handles `.` (current), `..` (parent), and plain relative paths.
fn resolve_relative_path(relative: &str, base: &str) -> String {
    let mut segments: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();

    for component in relative.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                // Clamped at the docs root.
                segments.pop();
            }
            _ => segments.push(component),
        }
    }

    segments.join("/")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn page(slug: &str) -> LinkBase {
        LinkBase::new(slug, false)
    }

    fn index(slug: &str) -> LinkBase {
        LinkBase::new(slug, true)
    }

    #[test]
    fn test_sibling_document() {
        assert_eq!(
            resolve_link("./data-loading.md", &page("guides/routing")).as_deref(),
            Some("data-loading")
        );
        assert_eq!(
            resolve_link("data-loading.md", &page("guides/routing")).as_deref(),
            Some("data-loading")
        );
    }

    #[test]
    fn test_parent_index() {
        assert_eq!(
            resolve_link("../api/index.md", &page("guides/routing")).as_deref(),
            Some("../api")
        );
        assert_eq!(
            resolve_link("../api/", &page("guides/routing")).as_deref(),
            Some("../api")
        );
    }

    #[test]
    fn test_from_index_document() {
        // docs/guides/index.md is served at "guides", so its children need the
        // directory in the relative URL.
        assert_eq!(
            resolve_link("./routing.md", &index("guides")).as_deref(),
            Some("guides/routing")
        );
        assert_eq!(
            resolve_link("../api/hooks.md", &index("guides")).as_deref(),
            Some("api/hooks")
        );
    }

    #[test]
    fn test_to_landing_page() {
        assert_eq!(
            resolve_link("../index.md", &page("guides/routing")).as_deref(),
            Some("../")
        );
        assert_eq!(
            resolve_link("index.md", &page("start")).as_deref(),
            Some("./")
        );
    }

    #[test]
    fn test_from_landing_page() {
        assert_eq!(
            resolve_link("guides/routing.md", &index("")).as_deref(),
            Some("guides/routing")
        );
    }

    #[test]
    fn test_fragment_preserved() {
        assert_eq!(
            resolve_link("../api/hooks.md#usenavigate", &page("guides/routing")).as_deref(),
            Some("../api/hooks#usenavigate")
        );
    }

    #[test]
    fn test_extensionless_document() {
        assert_eq!(
            resolve_link("../api/hooks", &page("guides/routing")).as_deref(),
            Some("../api/hooks")
        );
    }

    #[test]
    fn test_unchanged_links() {
        let base = page("guides/routing");
        for url in [
            "https://reactrouter.com",
            "//cdn.example.com/x.md",
            "mailto:team@example.com",
            "#section",
            "/absolute/path",
            "./diagram.png",
            "../assets/style.css",
            "",
        ] {
            assert_eq!(resolve_link(url, &base), None, "url {url:?}");
        }
    }

    #[test]
    fn test_traversal_clamped() {
        assert_eq!(
            resolve_link("../../../../secret.md", &page("guides/routing")).as_deref(),
            Some("../secret")
        );
    }

    #[test]
    fn test_link_base_source_dir() {
        assert_eq!(page("guides/routing").source_dir, "guides");
        assert_eq!(page("start").source_dir, "");
        assert_eq!(index("guides").source_dir, "guides");
        assert_eq!(index("").source_dir, "");
    }
}
