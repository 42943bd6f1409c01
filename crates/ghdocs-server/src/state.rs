//! Application state.
//!
//! Shared state for all request handlers.

use ghdocs_site::Docs;
use ghdocs_source::RepoId;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Cached documentation service.
    pub(crate) docs: Docs,
    /// Repository whose documentation is served.
    pub(crate) repo: RepoId,
}
