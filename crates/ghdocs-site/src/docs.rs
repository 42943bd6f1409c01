//! Versioned documentation service.
//!
//! [`Docs`] ties the pieces together: a version token resolves to a git ref,
//! the ref's archive is fetched and streamed through the extractor, and the
//! matching files become a menu or a rendered document. Every stage result
//! is held in a bounded TTL cache keyed by the resolved ref.

use std::fmt;
use std::io::ErrorKind;
use std::num::NonZeroUsize;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use ghdocs_cache::{CacheOptions, Fetcher, TtlCache};
use ghdocs_refs::{LOCAL_REF, RefKind, resolve_ref};
use ghdocs_renderer::{MarkdownRenderer, RenderResult, TocEntry};
use ghdocs_source::{
    ArchiveExtractor, ArchiveFetcher, ArchiveFile, ArchiveReader, RepoId, SourceError, SourceHost,
};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use crate::frontmatter::parse_front_matter;
use crate::menu::{MenuBuilder, MenuDoc, MenuError};
use crate::slug::doc_slug;

/// Cache sizes and lifetimes.
#[derive(Clone, Debug)]
pub struct CachePolicy {
    /// When false every lookup fetches fresh (single-flight and
    /// stale-on-error still apply).
    pub enabled: bool,
    /// Rendered documents.
    pub max_docs: usize,
    /// Menus.
    pub max_menus: usize,
    /// Tag and branch lists, per repository.
    pub max_lists: usize,
    /// Raw files.
    pub max_files: usize,
    /// Lifetime of content at a tag.
    pub tag_ttl: Duration,
    /// Lifetime of content at a branch or the local snapshot.
    pub branch_ttl: Duration,
    /// Lifetime of tag and branch lists.
    pub list_ttl: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_docs: 300,
            max_menus: 20,
            max_lists: 10,
            max_files: 100,
            tag_ttl: Duration::from_secs(24 * 60 * 60),
            branch_ttl: Duration::from_secs(5 * 60),
            list_ttl: Duration::from_secs(5 * 60),
        }
    }
}

/// Options for [`Docs`].
#[derive(Clone, Debug)]
pub struct DocsOptions {
    /// Ref served for tokens matching the newest release, e.g. `refs/heads/main`.
    pub default_branch_ref: String,
    /// Working copy backing the `local` ref.
    pub local_dir: Option<PathBuf>,
    /// Which archive paths are documentation.
    pub docs_pattern: Regex,
    /// Build the tag list from releases instead of tags.
    pub tags_from_releases: bool,
    /// Translation subtrees kept out of the default menu.
    pub languages: Vec<String>,
    /// Cache settings.
    pub cache: CachePolicy,
}

/// A rendered document.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Doc {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
    #[serde(flatten)]
    pub extra: std::collections::BTreeMap<String, serde_json::Value>,
    pub filename: String,
    pub slug: String,
    pub html: String,
    /// Table of contents.
    pub headings: Vec<TocEntry>,
}

impl Doc {
    /// Render an archive file served at `slug`.
    pub fn render(file: ArchiveFile, slug: &str) -> Result<Self, MenuError> {
        let (attrs, body) =
            parse_front_matter(&file.content).map_err(|source| MenuError::FrontMatter {
                filename: file.filename.clone(),
                source,
            })?;

        let is_index = file.filename == "index.md" || file.filename.ends_with("/index.md");
        let RenderResult { html, toc } = MarkdownRenderer::new()
            .with_page(slug, is_index)
            .render_markdown(body);

        Ok(Self {
            title: attrs.title.unwrap_or_else(|| file.filename.clone()),
            order: attrs.order,
            extra: attrs.extra,
            filename: file.filename,
            slug: slug.to_owned(),
            html,
            headings: toc,
        })
    }
}

/// Error serving documentation.
#[derive(Debug, thiserror::Error)]
pub enum DocsError {
    /// The source host could not answer.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The documentation content is broken.
    #[error(transparent)]
    Content(#[from] MenuError),

    /// A blocking task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result of a [`Docs`] call. Errors are shared between every caller
/// waiting on the same fetch.
pub type DocsResult<T> = Result<T, Arc<DocsError>>;

/// Everything the fetchers need.
struct Backend {
    host: Arc<dyn SourceHost>,
    archives: ArchiveFetcher,
    local_dir: Option<PathBuf>,
    pattern: Regex,
    tags_from_releases: bool,
    languages: Vec<String>,
    tag_ttl: Duration,
    branch_ttl: Duration,
}

impl Backend {
    fn ref_ttl(&self, git_ref: &str) -> Duration {
        match RefKind::classify(git_ref) {
            RefKind::Tag => self.tag_ttl,
            RefKind::Branch | RefKind::Local => self.branch_ttl,
        }
    }

    fn tag_names(&self, repo: &RepoId) -> Result<Vec<String>, DocsError> {
        if self.tags_from_releases {
            info!(repo = %repo, "Fetching releases");
            let releases = self.host.releases(repo)?;
            return Ok(releases
                .into_iter()
                .filter(|r| !r.draft)
                .map(|r| r.tag_name)
                .collect());
        }
        info!(repo = %repo, "Fetching tags");
        Ok(self.host.tags(repo)?)
    }

    fn branch_names(&self, repo: &RepoId) -> Result<Vec<String>, DocsError> {
        info!(repo = %repo, "Fetching branches");
        Ok(self.host.branches(repo)?)
    }

    fn extractor(
        &self,
        repo: &RepoId,
        git_ref: &str,
    ) -> Result<Option<ArchiveExtractor<ArchiveReader>>, DocsError> {
        info!(repo = %repo, git_ref, "Fetching archive");
        let reader = self.archives.fetch_archive(repo, git_ref)?;
        Ok(reader.map(|reader| ArchiveExtractor::new(reader, self.pattern.clone())))
    }

    fn build_menu(&self, key: &MenuKey) -> Result<Option<Vec<MenuDoc>>, DocsError> {
        let Some(mut extractor) = self.extractor(&key.repo, &key.git_ref)? else {
            return Ok(None);
        };

        let mut builder = MenuBuilder::new()
            .with_lang(key.lang.as_deref())
            .with_languages(self.languages.iter().map(String::as_str));
        for file in extractor.files()? {
            let file = file?;
            builder.add(&file.filename, &file.content)?;
        }
        Ok(Some(builder.build()?))
    }

    fn render_doc(&self, key: &PathKey) -> Result<Option<Doc>, DocsError> {
        let Some(mut extractor) = self.extractor(&key.repo, &key.git_ref)? else {
            return Ok(None);
        };

        let mut found: Option<ArchiveFile> = None;
        for file in extractor.files()? {
            let file = file?;
            if doc_slug(&file.filename) != key.path {
                continue;
            }
            if let Some(first) = found {
                return Err(MenuError::DuplicateSlug {
                    slug: key.path.clone(),
                    first: first.filename,
                    second: file.filename,
                }
                .into());
            }
            found = Some(file);
        }

        let Some(file) = found else {
            return Ok(None);
        };
        debug!(filename = %file.filename, "Rendering document");
        Ok(Some(Doc::render(file, &key.path)?))
    }

    fn read_file(&self, key: &PathKey) -> Result<Option<String>, DocsError> {
        if key.git_ref != LOCAL_REF {
            info!(repo = %key.repo, git_ref = %key.git_ref, path = %key.path, "Fetching file");
            return Ok(self.host.file(&key.repo, &key.git_ref, &key.path)?);
        }

        let Some(dir) = &self.local_dir else {
            return Ok(None);
        };
        let path = Path::new(&key.path);
        if !path.components().all(|c| matches!(c, Component::Normal(_))) {
            debug!(path = %key.path, "Rejecting local path outside the snapshot");
            return Ok(None);
        }
        match std::fs::read_to_string(dir.join(path)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SourceError::io(e).with_backend("Local").into()),
        }
    }
}

/// Run blocking work off the async runtime.
async fn blocking<T, F>(f: F) -> Result<T, DocsError>
where
    F: FnOnce() -> Result<T, DocsError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

/// Menu cache key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct MenuKey {
    repo: RepoId,
    git_ref: String,
    lang: Option<String>,
}

impl fmt::Display for MenuKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.repo, self.git_ref)?;
        if let Some(lang) = &self.lang {
            write!(f, "[{lang}]")?;
        }
        Ok(())
    }
}

/// Document or file cache key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct PathKey {
    repo: RepoId,
    git_ref: String,
    path: String,
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.repo, self.git_ref, self.path)
    }
}

struct TagsFetcher(Arc<Backend>);

impl Fetcher for TagsFetcher {
    type Key = RepoId;
    type Value = Arc<Vec<String>>;
    type Error = DocsError;

    async fn fetch(&self, repo: &RepoId) -> Result<Option<Self::Value>, DocsError> {
        let backend = Arc::clone(&self.0);
        let repo = repo.clone();
        let tags = blocking(move || backend.tag_names(&repo)).await?;
        Ok(Some(Arc::new(tags)))
    }
}

struct BranchesFetcher(Arc<Backend>);

impl Fetcher for BranchesFetcher {
    type Key = RepoId;
    type Value = Arc<Vec<String>>;
    type Error = DocsError;

    async fn fetch(&self, repo: &RepoId) -> Result<Option<Self::Value>, DocsError> {
        let backend = Arc::clone(&self.0);
        let repo = repo.clone();
        let branches = blocking(move || backend.branch_names(&repo)).await?;
        Ok(Some(Arc::new(branches)))
    }
}

struct MenuFetcher(Arc<Backend>);

impl Fetcher for MenuFetcher {
    type Key = MenuKey;
    type Value = Arc<Vec<MenuDoc>>;
    type Error = DocsError;

    async fn fetch(&self, key: &MenuKey) -> Result<Option<Self::Value>, DocsError> {
        let backend = Arc::clone(&self.0);
        let key = key.clone();
        let menu = blocking(move || backend.build_menu(&key)).await?;
        Ok(menu.map(Arc::new))
    }

    fn ttl(&self, key: &MenuKey) -> Option<Duration> {
        Some(self.0.ref_ttl(&key.git_ref))
    }
}

struct DocFetcher(Arc<Backend>);

impl Fetcher for DocFetcher {
    type Key = PathKey;
    type Value = Arc<Doc>;
    type Error = DocsError;

    async fn fetch(&self, key: &PathKey) -> Result<Option<Self::Value>, DocsError> {
        let backend = Arc::clone(&self.0);
        let key = key.clone();
        let doc = blocking(move || backend.render_doc(&key)).await?;
        Ok(doc.map(Arc::new))
    }

    fn ttl(&self, key: &PathKey) -> Option<Duration> {
        Some(self.0.ref_ttl(&key.git_ref))
    }
}

struct FileFetcher(Arc<Backend>);

impl Fetcher for FileFetcher {
    type Key = PathKey;
    type Value = Arc<String>;
    type Error = DocsError;

    async fn fetch(&self, key: &PathKey) -> Result<Option<Self::Value>, DocsError> {
        let backend = Arc::clone(&self.0);
        let key = key.clone();
        let content = blocking(move || backend.read_file(&key)).await?;
        Ok(content.map(Arc::new))
    }

    fn ttl(&self, key: &PathKey) -> Option<Duration> {
        Some(self.0.ref_ttl(&key.git_ref))
    }
}

fn capacity(max: usize) -> NonZeroUsize {
    NonZeroUsize::new(max).unwrap_or(NonZeroUsize::MIN)
}

/// Versioned documentation for repositories on a source host.
///
/// All caches are owned by the instance. Concurrent requests for the same
/// uncached menu or document share one archive download.
pub struct Docs {
    default_branch_ref: String,
    has_local: bool,
    tags: TtlCache<TagsFetcher>,
    branches: TtlCache<BranchesFetcher>,
    menus: TtlCache<MenuFetcher>,
    docs: TtlCache<DocFetcher>,
    files: TtlCache<FileFetcher>,
}

impl Docs {
    /// Create a service over `host`.
    pub fn new(host: Arc<dyn SourceHost>, options: DocsOptions) -> Self {
        let DocsOptions {
            default_branch_ref,
            local_dir,
            docs_pattern,
            tags_from_releases,
            languages,
            cache,
        } = options;

        let backend = Arc::new(Backend {
            archives: ArchiveFetcher::new(Arc::clone(&host), local_dir.clone()),
            host,
            local_dir,
            pattern: docs_pattern,
            tags_from_releases,
            languages,
            tag_ttl: cache.tag_ttl,
            branch_ttl: cache.branch_ttl,
        });

        let opts = |max: usize, ttl: Duration| {
            let options = CacheOptions::new(capacity(max), ttl);
            if cache.enabled { options } else { options.bypass() }
        };

        Self {
            default_branch_ref,
            has_local: backend.local_dir.is_some(),
            tags: TtlCache::new(
                "tags",
                TagsFetcher(Arc::clone(&backend)),
                opts(cache.max_lists, cache.list_ttl),
            ),
            branches: TtlCache::new(
                "branches",
                BranchesFetcher(Arc::clone(&backend)),
                opts(cache.max_lists, cache.list_ttl),
            ),
            menus: TtlCache::new(
                "menus",
                MenuFetcher(Arc::clone(&backend)),
                opts(cache.max_menus, cache.branch_ttl),
            ),
            docs: TtlCache::new(
                "docs",
                DocFetcher(Arc::clone(&backend)),
                opts(cache.max_docs, cache.branch_ttl),
            ),
            files: TtlCache::new(
                "files",
                FileFetcher(backend),
                opts(cache.max_files, cache.branch_ttl),
            ),
        }
    }

    /// Resolve a version token to a git ref.
    ///
    /// `local` resolves to itself when a local snapshot is configured.
    /// Returns `None` when nothing matches.
    pub async fn resolve(&self, repo: &RepoId, token: &str) -> DocsResult<Option<String>> {
        if token == LOCAL_REF && self.has_local {
            return Ok(Some(LOCAL_REF.to_owned()));
        }

        let (tags, branches) = tokio::try_join!(self.tags(repo), self.branches(repo))?;
        let resolved = resolve_ref(token, &tags, &branches, &self.default_branch_ref);
        debug!(repo = %repo, token, resolved = ?resolved, "Resolved version");
        Ok(resolved)
    }

    /// Tag names, newest first.
    pub async fn tags(&self, repo: &RepoId) -> DocsResult<Arc<Vec<String>>> {
        Ok(self.tags.fetch(repo).await?.unwrap_or_default())
    }

    /// Branch names.
    pub async fn branches(&self, repo: &RepoId) -> DocsResult<Arc<Vec<String>>> {
        Ok(self.branches.fetch(repo).await?.unwrap_or_default())
    }

    /// Navigation menu at `git_ref`, optionally for one language.
    ///
    /// Returns `None` when the ref has no archive.
    pub async fn menu(
        &self,
        repo: &RepoId,
        git_ref: &str,
        lang: Option<&str>,
    ) -> DocsResult<Option<Arc<Vec<MenuDoc>>>> {
        let key = MenuKey {
            repo: repo.clone(),
            git_ref: git_ref.to_owned(),
            lang: lang.filter(|l| !l.is_empty()).map(str::to_owned),
        };
        self.menus.fetch(&key).await
    }

    /// Rendered document at `git_ref`. The empty slug is the landing page.
    ///
    /// Hidden documents are served like any other.
    pub async fn doc(
        &self,
        repo: &RepoId,
        git_ref: &str,
        slug: &str,
    ) -> DocsResult<Option<Arc<Doc>>> {
        let key = PathKey {
            repo: repo.clone(),
            git_ref: git_ref.to_owned(),
            path: slug.trim_matches('/').to_owned(),
        };
        self.docs.fetch(&key).await
    }

    /// Raw content of a repository file at `git_ref`.
    pub async fn file(
        &self,
        repo: &RepoId,
        git_ref: &str,
        path: &str,
    ) -> DocsResult<Option<Arc<String>>> {
        let key = PathKey {
            repo: repo.clone(),
            git_ref: git_ref.to_owned(),
            path: path.trim_start_matches('/').to_owned(),
        };
        self.files.fetch(&key).await
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        self.tags.clear();
        self.branches.clear();
        self.menus.clear();
        self.docs.clear();
        self.files.clear();
    }
}

#[cfg(test)]
mod tests {
    use ghdocs_source::{MockHost, Release, SourceErrorKind};
    use pretty_assertions::assert_eq;
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Docs: Send, Sync);

    const REPO: &str = "remix-run/react-router";

    const V5_FILES: &[(&str, &str)] = &[
        ("docs/index.md", "# React Router\n\nStart at [guides](guides/index.md)."),
        ("docs/guides/index.md", "---\ntitle: Guides\norder: 1\n---\n"),
        (
            "docs/guides/routing.md",
            "---\ntitle: Routing\n---\n# Routing\n\n## Nested\n\nSee [hooks](../api/hooks.md#use-params).",
        ),
        ("docs/api/index.md", "---\ntitle: API\n---\n"),
        ("docs/api/hooks.md", "# Hooks"),
        ("docs/internal.md", "---\ntitle: Internal\nhidden: true\n---\nSecret"),
        ("docs/es/guias/index.md", "---\ntitle: Guías\n---\n"),
        ("docs/es/guias/rutas.md", "# Rutas"),
        ("README.md", "# not docs"),
    ];

    fn repo() -> RepoId {
        REPO.parse().unwrap()
    }

    fn mock() -> Arc<MockHost> {
        Arc::new(
            MockHost::new()
                .with_tags(REPO, &["v6.0.0", "v5.3.0", "v5.2.1", "v5.2.0"])
                .with_branches(REPO, &["main", "dev"])
                .with_archive(REPO, "refs/tags/v5.3.0", V5_FILES)
                .with_archive(REPO, "refs/heads/main", &[("docs/index.md", "# Main")]),
        )
    }

    fn options() -> DocsOptions {
        DocsOptions {
            default_branch_ref: "refs/heads/main".to_owned(),
            local_dir: None,
            docs_pattern: Regex::new(r"^docs/.+\.md$").unwrap(),
            tags_from_releases: false,
            languages: vec!["es".to_owned()],
            cache: CachePolicy::default(),
        }
    }

    fn service(host: &Arc<MockHost>, options: DocsOptions) -> Docs {
        Docs::new(Arc::clone(host) as Arc<dyn SourceHost>, options)
    }

    #[tokio::test]
    async fn test_resolve() {
        let docs = service(&mock(), options());

        assert_eq!(
            docs.resolve(&repo(), "v5").await.unwrap().as_deref(),
            Some("refs/tags/v5.3.0")
        );
        assert_eq!(
            docs.resolve(&repo(), "v6").await.unwrap().as_deref(),
            Some("refs/heads/main")
        );
        assert_eq!(
            docs.resolve(&repo(), "dev").await.unwrap().as_deref(),
            Some("refs/heads/dev")
        );
        assert_eq!(docs.resolve(&repo(), "v4").await.unwrap(), None);
        assert_eq!(docs.resolve(&repo(), "local").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_resolve_local() {
        let dir = tempfile::tempdir().unwrap();
        let docs = service(
            &mock(),
            DocsOptions {
                local_dir: Some(dir.path().to_path_buf()),
                ..options()
            },
        );

        assert_eq!(
            docs.resolve(&repo(), "local").await.unwrap().as_deref(),
            Some("local")
        );
    }

    #[tokio::test]
    async fn test_tags_from_releases() {
        let host = Arc::new(MockHost::new().with_releases(
            REPO,
            vec![
                Release {
                    tag_name: "v2.0.0".to_owned(),
                    draft: true,
                    prerelease: false,
                },
                Release {
                    tag_name: "v1.1.0".to_owned(),
                    draft: false,
                    prerelease: false,
                },
            ],
        ));
        let docs = service(
            &host,
            DocsOptions {
                tags_from_releases: true,
                ..options()
            },
        );

        assert_eq!(*docs.tags(&repo()).await.unwrap(), vec!["v1.1.0"]);
    }

    #[tokio::test]
    async fn test_menu() {
        let docs = service(&mock(), options());

        let menu = docs
            .menu(&repo(), "refs/tags/v5.3.0", None)
            .await
            .unwrap()
            .unwrap();

        let slugs: Vec<&str> = menu.iter().map(|d| d.slug.as_str()).collect();
        assert_eq!(slugs, vec!["guides", "api"]);
        assert_eq!(menu[0].children[0].title, "Routing");
        assert!(docs.menu(&repo(), "refs/tags/v1.0.0", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_translated_menu() {
        let docs = service(&mock(), options());

        let menu = docs
            .menu(&repo(), "refs/tags/v5.3.0", Some("es"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(menu.len(), 1);
        assert_eq!(menu[0].slug, "guias");
        assert_eq!(menu[0].children[0].slug, "guias/rutas");
    }

    #[tokio::test]
    async fn test_concurrent_menu_downloads_once() {
        let host = mock();
        let docs = service(&host, options());

        let repo = repo();
        let (a, b, c) = tokio::join!(
            docs.menu(&repo, "refs/tags/v5.3.0", None),
            docs.menu(&repo, "refs/tags/v5.3.0", None),
            docs.menu(&repo, "refs/tags/v5.3.0", None),
        );

        assert!(a.unwrap().is_some());
        assert!(b.unwrap().is_some());
        assert!(c.unwrap().is_some());
        assert_eq!(host.archive_calls(), 1);

        docs.menu(&repo, "refs/tags/v5.3.0", None).await.unwrap();
        assert_eq!(host.archive_calls(), 1);
    }

    #[tokio::test]
    async fn test_doc() {
        let docs = service(&mock(), options());

        let doc = docs
            .doc(&repo(), "refs/tags/v5.3.0", "guides/routing")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(doc.title, "Routing");
        assert_eq!(doc.filename, "docs/guides/routing.md");
        assert!(doc.html.contains(r#"<h2 id="nested">Nested</h2>"#));
        assert!(doc.html.contains(r##"href="../api/hooks#use-params""##));
        assert_eq!(doc.headings.len(), 2);
    }

    #[tokio::test]
    async fn test_landing_page() {
        let docs = service(&mock(), options());

        let doc = docs.doc(&repo(), "refs/tags/v5.3.0", "").await.unwrap().unwrap();
        assert_eq!(doc.slug, "");
        assert!(doc.html.contains(r#"href="guides""#));

        let main = docs.doc(&repo(), "refs/heads/main", "/").await.unwrap().unwrap();
        assert!(main.html.contains("Main"));
    }

    #[tokio::test]
    async fn test_hidden_doc_served() {
        let docs = service(&mock(), options());
        let doc = docs.doc(&repo(), "refs/tags/v5.3.0", "internal").await.unwrap();
        assert_eq!(doc.unwrap().title, "Internal");
    }

    #[tokio::test]
    async fn test_missing_doc() {
        let docs = service(&mock(), options());
        assert!(docs.doc(&repo(), "refs/tags/v5.3.0", "nope").await.unwrap().is_none());
        assert!(docs.doc(&repo(), "refs/tags/v1.0.0", "").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_content_error() {
        let host = Arc::new(MockHost::new().with_archive(
            REPO,
            "refs/heads/main",
            &[("docs/guides/routing.md", "# Orphan")],
        ));
        let docs = service(&host, options());

        let err = docs.menu(&repo(), "refs/heads/main", None).await.unwrap_err();
        assert!(matches!(&*err, DocsError::Content(MenuError::Orphan { .. })));
    }

    #[tokio::test]
    async fn test_duplicate_doc_is_content_error() {
        let host = Arc::new(MockHost::new().with_archive(
            REPO,
            "refs/heads/main",
            &[
                ("docs/guides.md", "# Guides"),
                ("docs/guides/index.md", "# Guides again"),
            ],
        ));
        let docs = service(&host, options());

        let err = docs.doc(&repo(), "refs/heads/main", "guides").await.unwrap_err();
        assert!(matches!(
            &*err,
            DocsError::Content(MenuError::DuplicateSlug { slug, .. }) if slug == "guides"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_menu_on_host_failure() {
        let host = mock();
        let docs = service(&host, options());

        let fresh = docs.menu(&repo(), "refs/heads/main", None).await.unwrap();
        assert!(fresh.is_some());

        tokio::time::advance(CachePolicy::default().branch_ttl + Duration::from_secs(1)).await;
        host.set_failing(true);

        let stale = docs.menu(&repo(), "refs/heads/main", None).await.unwrap();
        assert_eq!(stale, fresh);
        assert_eq!(host.archive_calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_without_cached_value() {
        let host = mock();
        host.set_failing(true);
        let docs = service(&host, options());

        let err = docs.doc(&repo(), "refs/heads/main", "").await.unwrap_err();
        assert!(matches!(
            &*err,
            DocsError::Source(e) if e.kind == SourceErrorKind::Unavailable
        ));
        assert!(docs.resolve(&repo(), "v5").await.is_err());
    }

    #[tokio::test]
    async fn test_cache_disabled_fetches_fresh() {
        let host = mock();
        let docs = service(
            &host,
            DocsOptions {
                cache: CachePolicy {
                    enabled: false,
                    ..CachePolicy::default()
                },
                ..options()
            },
        );

        docs.menu(&repo(), "refs/tags/v5.3.0", None).await.unwrap();
        docs.menu(&repo(), "refs/tags/v5.3.0", None).await.unwrap();
        assert_eq!(host.archive_calls(), 2);
    }

    #[tokio::test]
    async fn test_clear() {
        let host = mock();
        let docs = service(&host, options());

        docs.menu(&repo(), "refs/tags/v5.3.0", None).await.unwrap();
        docs.clear();
        docs.menu(&repo(), "refs/tags/v5.3.0", None).await.unwrap();
        assert_eq!(host.archive_calls(), 2);
    }

    #[tokio::test]
    async fn test_local_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("docs/guides")).unwrap();
        std::fs::write(
            dir.path().join("docs/guides/index.md"),
            "---\ntitle: Local\n---\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();

        let host = mock();
        let docs = service(
            &host,
            DocsOptions {
                local_dir: Some(dir.path().to_path_buf()),
                ..options()
            },
        );

        let menu = docs.menu(&repo(), LOCAL_REF, None).await.unwrap().unwrap();
        assert_eq!(menu[0].title, "Local");
        assert_eq!(host.archive_calls(), 0);

        let file = docs.file(&repo(), LOCAL_REF, "package.json").await.unwrap();
        assert_eq!(file.as_deref().map(String::as_str), Some("{}"));
        assert!(docs.file(&repo(), LOCAL_REF, "../etc/passwd").await.unwrap().is_none());
        assert!(docs.file(&repo(), LOCAL_REF, "missing.txt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remote_file() {
        let host = Arc::new(MockHost::new().with_file(
            REPO,
            "refs/heads/main",
            "package.json",
            r#"{"name":"react-router"}"#,
        ));
        let docs = service(&host, options());

        let file = docs.file(&repo(), "refs/heads/main", "/package.json").await.unwrap();
        assert!(file.unwrap().contains("react-router"));
        assert!(docs.file(&repo(), "refs/heads/dev", "package.json").await.unwrap().is_none());
    }
}
