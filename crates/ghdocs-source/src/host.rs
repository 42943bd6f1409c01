//! Source host abstraction.

use std::fmt;
use std::io::Read;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{SourceError, SourceErrorKind};

/// Streaming archive body (gzip-compressed tar).
pub type ArchiveReader = Box<dyn Read + Send>;

/// Repository identifier (`owner/name`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoId {
    owner: String,
    name: String,
}

impl RepoId {
    /// Repository owner (user or organization).
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for RepoId {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self {
                    owner: owner.to_owned(),
                    name: name.to_owned(),
                })
            }
            _ => Err(SourceError::new(SourceErrorKind::InvalidRepo)
                .with_message(format!("expected owner/name, got '{s}'"))),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A published release.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Release {
    /// Tag the release points at.
    pub tag_name: String,
    /// Unpublished draft.
    #[serde(default)]
    pub draft: bool,
    /// Marked as pre-release on the host.
    #[serde(default)]
    pub prerelease: bool,
}

/// Remote source-control host.
///
/// Calls block on network I/O. Async callers run them on a blocking thread.
///
/// `Ok(None)` means the host answered that the thing does not exist.
/// `Err` means the host could not answer.
pub trait SourceHost: Send + Sync {
    /// Tag names, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the host is unreachable or refuses the request.
    fn tags(&self, repo: &RepoId) -> Result<Vec<String>, SourceError>;

    /// Branch names.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the host is unreachable or refuses the request.
    fn branches(&self, repo: &RepoId) -> Result<Vec<String>, SourceError>;

    /// Releases, newest first, across all pages.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the host is unreachable or refuses the request.
    fn releases(&self, repo: &RepoId) -> Result<Vec<Release>, SourceError>;

    /// Raw UTF-8 content of `path` at `git_ref`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the host is unreachable or refuses the request.
    fn file(&self, repo: &RepoId, git_ref: &str, path: &str)
    -> Result<Option<String>, SourceError>;

    /// Repository archive at `git_ref`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the host is unreachable, rate limited, or
    /// failing with a server error.
    fn archive(&self, repo: &RepoId, git_ref: &str) -> Result<Option<ArchiveReader>, SourceError>;
}
