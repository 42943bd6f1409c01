//! Ref listing and version resolution endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::ServerError;
use crate::handlers::resolve_version;
use crate::state::AppState;

/// Response for GET /api/refs.
#[derive(Serialize)]
struct RefsResponse<'a> {
    /// Tag names, newest first.
    tags: &'a [String],
    /// Branch names.
    branches: &'a [String],
}

/// Response for GET /api/resolve/{version}.
#[derive(Serialize)]
pub(crate) struct ResolveResponse {
    #[serde(rename = "ref")]
    git_ref: String,
}

/// Handle GET /api/refs.
pub(crate) async fn get_refs(State(state): State<Arc<AppState>>) -> Result<Response, ServerError> {
    let (tags, branches) = tokio::try_join!(
        state.docs.tags(&state.repo),
        state.docs.branches(&state.repo)
    )?;

    Ok(Json(RefsResponse {
        tags: &tags,
        branches: &branches,
    })
    .into_response())
}

/// Handle GET /api/resolve/{version}.
pub(crate) async fn get_resolve(
    Path(version): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ResolveResponse>, ServerError> {
    let git_ref = resolve_version(&state, &version).await?;
    Ok(Json(ResolveResponse { git_ref }))
}
