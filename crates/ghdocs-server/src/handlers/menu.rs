//! Navigation menu endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::error::ServerError;
use crate::handlers::resolve_version;
use crate::state::AppState;

/// Query parameters for GET /api/{version}/menu.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct MenuQuery {
    /// Language subtree (`docs/<lang>/`).
    lang: Option<String>,
}

/// Handle GET /api/{version}/menu.
pub(crate) async fn get_menu(
    Path(version): Path<String>,
    Query(query): Query<MenuQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ServerError> {
    let git_ref = resolve_version(&state, &version).await?;
    let menu = state
        .docs
        .menu(&state.repo, &git_ref, query.lang.as_deref())
        .await?
        .ok_or(ServerError::VersionNotFound(version))?;

    Ok(Json(menu.as_slice()).into_response())
}
