//! Source host access for ghdocs.
//!
//! This crate talks to the remote source-control host and turns repository
//! archives into documentation files:
//!
//! - [`SourceHost`] trait with `tags()`, `branches()`, `releases()`, `file()`
//!   and `archive()` methods
//! - [`GitHubHost`] implementation over the GitHub REST API
//! - [`ArchiveFetcher`] that serves the reserved `local` ref from a working copy
//! - [`ArchiveExtractor`] that streams matching files out of a `.tar.gz`
//! - [`MockHost`] for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use ghdocs_source::{ArchiveExtractor, ArchiveFetcher, GitHubHost};
//!
//! let host = Arc::new(GitHubHost::new("https://api.github.com", None, Duration::from_secs(30)));
//! let fetcher = ArchiveFetcher::new(host, None);
//! let repo = "remix-run/react-router".parse()?;
//! if let Some(reader) = fetcher.fetch_archive(&repo, "refs/heads/main")? {
//!     let mut extractor = ArchiveExtractor::new(reader, regex::Regex::new(r"^docs/.+\.md$")?);
//!     for file in extractor.files()? {
//!         let file = file?;
//!         println!("{}: {} bytes", file.filename, file.content.len());
//!     }
//! }
//! ```

mod archive;
mod error;
mod github;
mod host;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use archive::{
    ArchiveExtractor, ArchiveFetcher, ArchiveFile, ArchiveFiles, pack_dir, pack_files,
};
pub use error::{SourceError, SourceErrorKind};
pub use github::GitHubHost;
pub use host::{ArchiveReader, Release, RepoId, SourceHost};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockHost;
