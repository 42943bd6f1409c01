//! Mock source host for testing.
//!
//! Provides [`MockHost`] for unit testing without network access.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::archive::pack_files;
use crate::error::{SourceError, SourceErrorKind};
use crate::host::{ArchiveReader, Release, RepoId, SourceHost};

/// Mock source host for testing.
///
/// Serves tags, branches, releases, files and archives from memory. Use the
/// builder methods to configure it with test data, and [`MockHost::set_failing`]
/// to simulate an unreachable host.
///
/// # Example
///
/// ```ignore
/// use ghdocs_source::{MockHost, SourceHost};
///
/// let host = MockHost::new()
///     .with_tags("owner/name", &["v1.0.0"])
///     .with_archive("owner/name", "refs/tags/v1.0.0", &[("docs/index.md", "# Home")]);
///
/// let repo = "owner/name".parse().unwrap();
/// assert_eq!(host.tags(&repo).unwrap(), vec!["v1.0.0"]);
/// ```
#[derive(Debug, Default)]
pub struct MockHost {
    tags: RwLock<HashMap<String, Vec<String>>>,
    branches: RwLock<HashMap<String, Vec<String>>>,
    releases: RwLock<HashMap<String, Vec<Release>>>,
    files: RwLock<HashMap<(String, String, String), String>>,
    archives: RwLock<HashMap<(String, String), Vec<u8>>>,
    failing: AtomicBool,
    archive_calls: AtomicUsize,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

impl MockHost {
    /// Create a new empty mock host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tag list (newest first) for a repository.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_tags(self, repo: &str, tags: &[&str]) -> Self {
        self.tags.write().unwrap().insert(repo.to_owned(), owned(tags));
        self
    }

    /// Set the branch list for a repository.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_branches(self, repo: &str, branches: &[&str]) -> Self {
        self.branches
            .write()
            .unwrap()
            .insert(repo.to_owned(), owned(branches));
        self
    }

    /// Set the release list (newest first) for a repository.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_releases(self, repo: &str, releases: Vec<Release>) -> Self {
        self.releases
            .write()
            .unwrap()
            .insert(repo.to_owned(), releases);
        self
    }

    /// Add a raw file at a ref.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_file(self, repo: &str, git_ref: &str, path: &str, content: &str) -> Self {
        self.files.write().unwrap().insert(
            (repo.to_owned(), git_ref.to_owned(), path.to_owned()),
            content.to_owned(),
        );
        self
    }

    /// Add an archive at a ref built from `(path, content)` pairs.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned or packing fails.
    #[must_use]
    pub fn with_archive(self, repo: &str, git_ref: &str, files: &[(&str, &str)]) -> Self {
        self.set_archive(repo, git_ref, files);
        self
    }

    /// Serve `bytes` verbatim as the archive at a ref.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_raw_archive(self, repo: &str, git_ref: &str, bytes: &[u8]) -> Self {
        self.archives
            .write()
            .unwrap()
            .insert((repo.to_owned(), git_ref.to_owned()), bytes.to_vec());
        self
    }

    /// Replace the archive at a ref.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned or packing fails.
    pub fn set_archive(&self, repo: &str, git_ref: &str, files: &[(&str, &str)]) {
        let top_dir = format!("{}-mock", repo.replace('/', "-"));
        let bytes = pack_files(&top_dir, files.iter().copied()).unwrap();
        self.archives
            .write()
            .unwrap()
            .insert((repo.to_owned(), git_ref.to_owned()), bytes);
    }

    /// Make every call fail with [`SourceErrorKind::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of archive downloads served or attempted.
    pub fn archive_calls(&self) -> usize {
        self.archive_calls.load(Ordering::SeqCst)
    }

    fn check(&self, repo: &RepoId) -> Result<(), SourceError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SourceError::new(SourceErrorKind::Unavailable)
                .with_backend("Mock")
                .with_repo(repo)
                .with_message("mock host is failing"));
        }
        Ok(())
    }
}

impl SourceHost for MockHost {
    fn tags(&self, repo: &RepoId) -> Result<Vec<String>, SourceError> {
        self.check(repo)?;
        Ok(self
            .tags
            .read()
            .unwrap()
            .get(&repo.to_string())
            .cloned()
            .unwrap_or_default())
    }

    fn branches(&self, repo: &RepoId) -> Result<Vec<String>, SourceError> {
        self.check(repo)?;
        Ok(self
            .branches
            .read()
            .unwrap()
            .get(&repo.to_string())
            .cloned()
            .unwrap_or_default())
    }

    fn releases(&self, repo: &RepoId) -> Result<Vec<Release>, SourceError> {
        self.check(repo)?;
        Ok(self
            .releases
            .read()
            .unwrap()
            .get(&repo.to_string())
            .cloned()
            .unwrap_or_default())
    }

    fn file(
        &self,
        repo: &RepoId,
        git_ref: &str,
        path: &str,
    ) -> Result<Option<String>, SourceError> {
        self.check(repo)?;
        let key = (repo.to_string(), git_ref.to_owned(), path.to_owned());
        Ok(self.files.read().unwrap().get(&key).cloned())
    }

    fn archive(&self, repo: &RepoId, git_ref: &str) -> Result<Option<ArchiveReader>, SourceError> {
        self.archive_calls.fetch_add(1, Ordering::SeqCst);
        self.check(repo)?;
        let key = (repo.to_string(), git_ref.to_owned());
        Ok(self
            .archives
            .read()
            .unwrap()
            .get(&key)
            .cloned()
            .map(|bytes| Box::new(Cursor::new(bytes)) as ArchiveReader))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use regex::Regex;

    use super::*;
    use crate::archive::ArchiveExtractor;

    fn repo() -> RepoId {
        "owner/name".parse().unwrap()
    }

    #[test]
    fn test_lists() {
        let host = MockHost::new()
            .with_tags("owner/name", &["v2.0.0", "v1.0.0"])
            .with_branches("owner/name", &["main"]);

        assert_eq!(host.tags(&repo()).unwrap(), vec!["v2.0.0", "v1.0.0"]);
        assert_eq!(host.branches(&repo()).unwrap(), vec!["main"]);
        assert!(host.releases(&repo()).unwrap().is_empty());
    }

    #[test]
    fn test_file() {
        let host = MockHost::new().with_file("owner/name", "refs/heads/main", "README.md", "hi");

        assert_eq!(
            host.file(&repo(), "refs/heads/main", "README.md").unwrap(),
            Some("hi".to_owned())
        );
        assert_eq!(host.file(&repo(), "refs/heads/dev", "README.md").unwrap(), None);
    }

    #[test]
    fn test_archive_round_trip() {
        let host = MockHost::new().with_archive(
            "owner/name",
            "refs/heads/main",
            &[("docs/index.md", "# Home")],
        );

        let reader = host.archive(&repo(), "refs/heads/main").unwrap().unwrap();
        let mut extractor = ArchiveExtractor::new(reader, Regex::new(r"^docs/").unwrap());
        let files: Vec<_> = extractor.files().unwrap().map(Result::unwrap).collect();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "docs/index.md");
        assert!(host.archive(&repo(), "refs/heads/dev").unwrap().is_none());
        assert_eq!(host.archive_calls(), 2);
    }

    #[test]
    fn test_failing() {
        let host = MockHost::new().with_tags("owner/name", &["v1.0.0"]);
        host.set_failing(true);

        let err = host.tags(&repo()).unwrap_err();
        assert_eq!(err.kind, SourceErrorKind::Unavailable);
        assert!(host.archive(&repo(), "refs/heads/main").is_err());

        host.set_failing(false);
        assert!(host.tags(&repo()).is_ok());
    }
}
