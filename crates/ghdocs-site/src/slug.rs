//! Document slugs.
//!
//! A slug is a document's path inside the docs tree without extension or
//! trailing `index` segment: `docs/guides/index.md` and `docs/guides.md`
//! are both `guides`, `docs/index.md` is the empty slug.

/// Derive the slug of an archive filename.
///
/// Everything up to and including the last `docs/` path segment is removed.
///
/// ```
/// use ghdocs_site::doc_slug;
///
/// assert_eq!(doc_slug("docs/guides/index.md"), "guides");
/// assert_eq!(doc_slug("packages/router/docs/api/hooks.md"), "api/hooks");
/// assert_eq!(doc_slug("docs/index.md"), "");
/// ```
#[must_use]
pub fn doc_slug(filename: &str) -> String {
    let rest = filename
        .rmatch_indices("docs/")
        .find(|(idx, _)| *idx == 0 || filename.as_bytes()[idx - 1] == b'/')
        .map_or(filename, |(idx, m)| &filename[idx + m.len()..]);

    let rest = rest.strip_suffix(".md").unwrap_or(rest);
    let rest = if rest == "index" {
        ""
    } else {
        rest.strip_suffix("/index").unwrap_or(rest)
    };
    rest.trim_end_matches('/').to_owned()
}

/// Slug of a document within a language subtree.
///
/// Returns `None` for documents outside `docs/<lang>/`. Without a language
/// every document keeps its plain slug.
pub(crate) fn localized_slug(filename: &str, lang: Option<&str>) -> Option<String> {
    let slug = doc_slug(filename);
    let Some(lang) = lang else {
        return Some(slug);
    };
    if slug == lang {
        return Some(String::new());
    }
    slug.strip_prefix(lang)
        .and_then(|rest| rest.strip_prefix('/'))
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_doc_slug() {
        assert_eq!(doc_slug("docs/start/overview.md"), "start/overview");
        assert_eq!(doc_slug("docs/guides/index.md"), "guides");
        assert_eq!(doc_slug("docs/guides/"), "guides");
        assert_eq!(doc_slug("docs/index.md"), "");
        assert_eq!(doc_slug("docs/README"), "README");
    }

    #[test]
    fn test_doc_slug_last_docs_segment() {
        assert_eq!(doc_slug("docs/api/docs/intro.md"), "intro");
        assert_eq!(doc_slug("website/docs/intro.md"), "intro");
        // Not a segment boundary.
        assert_eq!(doc_slug("docs/mydocs/intro.md"), "mydocs/intro");
    }

    #[test]
    fn test_doc_slug_without_docs_dir() {
        assert_eq!(doc_slug("guide.md"), "guide");
        assert_eq!(doc_slug("index.md"), "");
    }

    #[test]
    fn test_localized_slug() {
        assert_eq!(
            localized_slug("docs/es/guides/routing.md", Some("es")).as_deref(),
            Some("guides/routing")
        );
        assert_eq!(localized_slug("docs/es/index.md", Some("es")).as_deref(), Some(""));
        assert_eq!(localized_slug("docs/guides/routing.md", Some("es")), None);
        assert_eq!(localized_slug("docs/esperanto/x.md", Some("es")), None);
        assert_eq!(
            localized_slug("docs/es/x.md", None).as_deref(),
            Some("es/x")
        );
    }
}
