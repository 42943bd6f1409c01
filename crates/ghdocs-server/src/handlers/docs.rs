//! Document endpoint.
//!
//! Returns a rendered document as JSON with an `ETag` derived from the
//! resolved ref and the HTML, so clients revalidate cheaply with
//! `If-None-Match`.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use md5::{Digest, Md5};
use serde::Serialize;

use ghdocs_site::Doc;

use crate::error::ServerError;
use crate::handlers::resolve_version;
use crate::state::AppState;

/// Response for GET /api/{version}/docs/{slug}.
#[derive(Serialize)]
struct DocResponse<'a> {
    /// Resolved git ref.
    #[serde(rename = "ref")]
    git_ref: &'a str,
    #[serde(flatten)]
    doc: &'a Doc,
}

/// Handle GET /api/{version}/docs/ (landing page).
pub(crate) async fn get_landing_doc(
    Path(version): Path<String>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    get_doc_impl(version, String::new(), &state, &headers).await
}

/// Handle GET /api/{version}/docs/{slug}.
pub(crate) async fn get_doc(
    Path((version, slug)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    get_doc_impl(version, slug, &state, &headers).await
}

async fn get_doc_impl(
    version: String,
    slug: String,
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Response, ServerError> {
    let git_ref = resolve_version(state, &version).await?;
    let Some(doc) = state.docs.doc(&state.repo, &git_ref, &slug).await? else {
        return Err(ServerError::DocNotFound { version, slug });
    };

    let etag = compute_etag(&git_ref, &doc.html);

    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && if_none_match.as_bytes() == etag.as_bytes()
    {
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
    }

    let body = DocResponse {
        git_ref: &git_ref,
        doc: &doc,
    };

    Ok((
        [
            (header::ETAG, etag),
            (header::CACHE_CONTROL, "private, max-age=60".to_owned()),
        ],
        Json(body),
    )
        .into_response())
}

/// Compute `ETag` from the resolved ref and rendered HTML.
///
/// Uses MD5 hash truncated to 64 bits (16 hex chars).
fn compute_etag(git_ref: &str, html: &str) -> String {
    let hash = Md5::digest(format!("{git_ref}:{html}").as_bytes());
    format!("\"{}\"", &hex::encode(hash)[..16])
}
