//! Error types for the HTTP server.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ghdocs_site::DocsError;
use serde_json::json;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// No ref matches the version token.
    #[error("Version not found: {0}")]
    VersionNotFound(String),

    /// The version exists but has no such document.
    #[error("Document not found: {version}/{slug}")]
    DocNotFound { version: String, slug: String },

    /// Fetching or building documentation failed.
    #[error(transparent)]
    Docs(#[from] Arc<DocsError>),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::VersionNotFound(version) => (
                StatusCode::NOT_FOUND,
                json!({"error": "Version not found", "version": version}),
            ),
            Self::DocNotFound { version, slug } => (
                StatusCode::NOT_FOUND,
                json!({"error": "Document not found", "version": version, "slug": slug}),
            ),
            Self::Docs(err) => match err.as_ref() {
                DocsError::Source(e) if e.is_unavailable() => {
                    tracing::warn!(error = %e, "Upstream unavailable");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        json!({"error": "Upstream unavailable", "detail": e.to_string()}),
                    )
                }
                DocsError::Source(e) => {
                    tracing::error!(error = %e, "Source read failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        json!({"error": "Source read failed", "detail": e.to_string()}),
                    )
                }
                DocsError::Content(e) => {
                    tracing::error!(error = %e, "Broken documentation content");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        json!({"error": "Invalid documentation content", "detail": e.to_string()}),
                    )
                }
                DocsError::Task(e) => {
                    tracing::error!(error = %e, "Background task failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        json!({"error": "Internal error"}),
                    )
                }
            },
        };

        (status, axum::Json(body)).into_response()
    }
}
