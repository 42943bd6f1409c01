//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::security;
use crate::state::AppState;

/// Create the application router.
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/refs", get(handlers::refs::get_refs))
        .route("/api/resolve/{version}", get(handlers::refs::get_resolve))
        .route("/api/{version}/menu", get(handlers::menu::get_menu))
        .route("/api/{version}/docs/", get(handlers::docs::get_landing_doc))
        .route("/api/{version}/docs/{*slug}", get(handlers::docs::get_doc))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(security::csp_layer())
                .layer(security::content_type_options_layer())
                .layer(security::frame_options_layer()),
        )
        .with_state(state)
}
