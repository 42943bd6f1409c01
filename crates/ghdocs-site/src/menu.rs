//! Navigation menu construction.
//!
//! Documents become a tree by slug: `guides/routing` is a child of
//! `guides`. Every directory holding documents needs its own `index.md` (or
//! sibling `<dir>.md`); a document without a parent is an authoring error
//! and fails the whole build instead of being dropped.

use std::collections::{BTreeMap, HashMap};
use std::mem;

use serde::Serialize;

use crate::frontmatter::{Attributes, parse_front_matter};
use crate::slug::localized_slug;

/// Node of the navigation tree.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuDoc {
    /// Front-matter title, or the filename when absent.
    pub title: String,
    /// Front-matter order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
    /// Unrecognized front-matter keys.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
    /// Archive path of the source file.
    pub filename: String,
    /// URL slug.
    pub slug: String,
    /// Whether the body after the front-matter has any text.
    pub has_content: bool,
    /// Child documents, in display order.
    pub children: Vec<MenuDoc>,
}

/// Error building a menu.
#[derive(Debug, thiserror::Error)]
pub enum MenuError {
    /// Front-matter is not valid YAML or not a mapping.
    #[error("invalid front-matter in {filename}: {source}")]
    FrontMatter {
        filename: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// A document's parent directory has no document of its own.
    #[error("document '{slug}' has no parent document '{parent}' (missing or hidden index.md?)")]
    Orphan { slug: String, parent: String },

    /// Two files map to the same slug.
    #[error("{first} and {second} both map to slug '{slug}'")]
    DuplicateSlug {
        slug: String,
        first: String,
        second: String,
    },
}

/// Incremental menu builder.
///
/// Files are added one at a time so an archive can be streamed through
/// without holding document bodies.
#[derive(Debug, Default)]
pub struct MenuBuilder {
    lang: Option<String>,
    languages: Vec<String>,
    /// Slug to filename of every file seen, hidden ones included.
    claimed: HashMap<String, String>,
    docs: Vec<MenuDoc>,
}

impl MenuBuilder {
    /// Create a builder for the whole docs tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only include documents under `docs/<lang>/`, with the language prefix
    /// removed from their slugs.
    #[must_use]
    pub fn with_lang(mut self, lang: Option<&str>) -> Self {
        self.lang = lang.map(str::to_owned);
        self
    }

    /// Translation subtrees (`docs/<lang>/`) left out of a menu built
    /// without a language.
    #[must_use]
    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    /// Add a file.
    pub fn add(&mut self, filename: &str, content: &str) -> Result<(), MenuError> {
        let Some(slug) = localized_slug(filename, self.lang.as_deref()) else {
            return Ok(());
        };
        if self.lang.is_none() && is_translation(&slug, &self.languages) {
            return Ok(());
        }

        if let Some(first) = self.claimed.get(&slug) {
            return Err(MenuError::DuplicateSlug {
                slug,
                first: first.clone(),
                second: filename.to_owned(),
            });
        }
        self.claimed.insert(slug.clone(), filename.to_owned());

        let (attrs, body) =
            parse_front_matter(content).map_err(|source| MenuError::FrontMatter {
                filename: filename.to_owned(),
                source,
            })?;

        if slug.is_empty() || attrs.hidden {
            return Ok(());
        }

        let Attributes {
            title, order, extra, ..
        } = attrs;

        self.docs.push(MenuDoc {
            title: title.unwrap_or_else(|| filename.to_owned()),
            order,
            extra,
            filename: filename.to_owned(),
            slug,
            has_content: !body.trim().is_empty(),
            children: Vec::new(),
        });
        Ok(())
    }

    /// Assemble the tree.
    pub fn build(self) -> Result<Vec<MenuDoc>, MenuError> {
        let mut docs = self.docs;
        docs.sort_by(|a, b| a.slug.cmp(&b.slug));

        // Pass 1: slug index. Slugs are unique, `add` rejects repeats.
        let index: HashMap<&str, usize> = docs
            .iter()
            .enumerate()
            .map(|(pos, doc)| (doc.slug.as_str(), pos))
            .collect();

        // Pass 2: parent links.
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); docs.len()];
        let mut roots = Vec::new();
        for (pos, doc) in docs.iter().enumerate() {
            match doc.slug.rsplit_once('/') {
                None => roots.push(pos),
                Some((parent, _)) => {
                    let Some(&parent_pos) = index.get(parent) else {
                        return Err(MenuError::Orphan {
                            slug: doc.slug.clone(),
                            parent: parent.to_owned(),
                        });
                    };
                    children[parent_pos].push(pos);
                }
            }
        }

        // Children sort after their parent, so attaching in reverse order
        // finishes every subtree before it is moved.
        for pos in (0..docs.len()).rev() {
            let mut kids: Vec<MenuDoc> = children[pos]
                .iter()
                .map(|&child| mem::take(&mut docs[child]))
                .collect();
            sort_by_order(&mut kids);
            docs[pos].children = kids;
        }

        let mut tree: Vec<MenuDoc> = roots
            .into_iter()
            .map(|pos| mem::take(&mut docs[pos]))
            .collect();
        sort_by_order(&mut tree);
        Ok(tree)
    }
}

/// Build a menu from `(filename, content)` pairs.
///
/// ```
/// use ghdocs_site::build_menu;
///
/// let menu = build_menu([
///     ("docs/index.md", "# Home"),
///     ("docs/guides/index.md", "---\ntitle: Guides\n---\n"),
///     ("docs/guides/routing.md", "# Routing"),
/// ])?;
///
/// assert_eq!(menu.len(), 1);
/// assert_eq!(menu[0].title, "Guides");
/// assert!(!menu[0].has_content);
/// assert_eq!(menu[0].children[0].slug, "guides/routing");
/// # Ok::<(), ghdocs_site::MenuError>(())
/// ```
pub fn build_menu<'a, I>(files: I) -> Result<Vec<MenuDoc>, MenuError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut builder = MenuBuilder::new();
    for (filename, content) in files {
        builder.add(filename, content)?;
    }
    builder.build()
}

/// Stable sort by `order`, missing orders last.
fn sort_by_order(docs: &mut [MenuDoc]) {
    docs.sort_by(|a, b| {
        let a = a.order.unwrap_or(f64::INFINITY);
        let b = b.order.unwrap_or(f64::INFINITY);
        a.total_cmp(&b)
    });
}

/// Whether `slug` lies in one of the `languages` subtrees.
pub(crate) fn is_translation(slug: &str, languages: &[String]) -> bool {
    let top = slug.split('/').next().unwrap_or(slug);
    languages.iter().any(|lang| lang == top)
}
