//! HTTP request handlers.

pub(crate) mod docs;
pub(crate) mod menu;
pub(crate) mod refs;

use crate::error::ServerError;
use crate::state::AppState;

/// Resolve a version token from the URL to a git ref.
pub(crate) async fn resolve_version(
    state: &AppState,
    version: &str,
) -> Result<String, ServerError> {
    state
        .docs
        .resolve(&state.repo, version)
        .await?
        .ok_or_else(|| ServerError::VersionNotFound(version.to_owned()))
}
