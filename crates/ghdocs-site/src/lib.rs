//! Menus and rendered documents for versioned documentation sites.
//!
//! This crate provides:
//! - Front-matter parsing ([`Attributes`], [`parse_front_matter`])
//! - Slug derivation from archive paths ([`doc_slug`])
//! - Navigation tree construction ([`MenuBuilder`], [`build_menu`])
//! - The cached [`Docs`] service serving menus, documents and raw files for
//!   any version of a repository
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use ghdocs_site::{CachePolicy, Docs, DocsOptions};
//! use ghdocs_source::GitHubHost;
//!
//! let host = Arc::new(GitHubHost::new("https://api.github.com", None, timeout));
//! let docs = Docs::new(host, DocsOptions {
//!     default_branch_ref: "refs/heads/main".to_owned(),
//!     local_dir: None,
//!     docs_pattern: regex::Regex::new(r"^docs/.+\.md$")?,
//!     tags_from_releases: false,
//!     languages: Vec::new(),
//!     cache: CachePolicy::default(),
//! });
//!
//! let repo = "remix-run/react-router".parse()?;
//! if let Some(git_ref) = docs.resolve(&repo, "v6").await? {
//!     let menu = docs.menu(&repo, &git_ref, None).await?;
//!     let doc = docs.doc(&repo, &git_ref, "start/overview").await?;
//! }
//! ```

mod docs;
mod frontmatter;
mod menu;
mod slug;

pub use docs::{CachePolicy, Doc, Docs, DocsError, DocsOptions, DocsResult};
pub use frontmatter::{Attributes, parse_front_matter};
pub use menu::{MenuBuilder, MenuDoc, MenuError, build_menu};
pub use slug::doc_slug;
