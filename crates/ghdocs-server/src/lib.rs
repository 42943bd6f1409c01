//! HTTP server for ghdocs.
//!
//! This crate exposes the [`Docs`] service of one repository as a JSON API:
//!
//! | Route                              | Response                          |
//! |------------------------------------|-----------------------------------|
//! | `GET /api/refs`                    | `{ tags, branches }`              |
//! | `GET /api/resolve/{version}`       | `{ ref }`                         |
//! | `GET /api/{version}/menu?lang=xx`  | menu tree                         |
//! | `GET /api/{version}/docs/{*slug}`  | rendered document with an `ETag`  |
//!
//! Unknown versions and documents are 404. When the source host is down and
//! nothing cached can stand in, the response is 503. Broken documentation
//! content is 500.
//!
//! # Quick Start
//!
//! ```ignore
//! use ghdocs_server::{docs_options_from_config, run_server, server_config_from_config};
//!
//! let config = ghdocs_config::Config::load(None, None)?;
//! let docs = Docs::new(host, docs_options_from_config(&config)?);
//! run_server(server_config_from_config(&config)?, docs).await?;
//! ```

mod app;
mod error;
mod handlers;
mod middleware;
mod state;

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use ghdocs_config::{Config, TagSource};
use ghdocs_site::{CachePolicy, Docs, DocsOptions};
use ghdocs_source::{RepoId, SourceError};
use regex::Regex;
use state::AppState;

pub use error::ServerError;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Repository whose documentation is served.
    pub repo: RepoId,
}

/// Run the server until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address is invalid or cannot be bound.
pub async fn run_server(
    config: ServerConfig,
    docs: Docs,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState {
        docs,
        repo: config.repo.clone(),
    });

    let app = app::create_router(state);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
    tracing::info!(address = %addr, repo = %config.repo, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Create server configuration from ghdocs config.
///
/// # Errors
///
/// Returns [`SourceError`] if `source.repo` is not `owner/name`.
pub fn server_config_from_config(config: &Config) -> Result<ServerConfig, SourceError> {
    Ok(ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        repo: config.source_resolved.repo.parse()?,
    })
}

/// Create documentation service options from ghdocs config.
///
/// # Errors
///
/// Returns [`regex::Error`] if `source.docs_pattern` does not compile.
pub fn docs_options_from_config(config: &Config) -> Result<DocsOptions, regex::Error> {
    let source = &config.source_resolved;
    let cache = &config.cache;

    Ok(DocsOptions {
        default_branch_ref: source.default_branch_ref(),
        local_dir: source.local_dir.clone(),
        docs_pattern: Regex::new(&source.docs_pattern)?,
        tags_from_releases: source.tags_from == TagSource::Releases,
        languages: source.languages.clone(),
        cache: CachePolicy {
            enabled: cache.enabled,
            max_docs: cache.max_docs,
            max_menus: cache.max_menus,
            max_lists: cache.max_lists,
            max_files: cache.max_files,
            tag_ttl: Duration::from_secs(cache.tag_ttl_secs),
            branch_ttl: Duration::from_secs(cache.branch_ttl_secs),
            list_ttl: Duration::from_secs(cache.list_ttl_secs),
        },
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_docs_options_from_config() {
        let mut config = Config::default();
        config.source_resolved.repo = "remix-run/react-router".to_owned();
        config.source_resolved.tags_from = TagSource::Releases;
        config.source_resolved.languages = vec!["ja".to_owned()];
        config.cache.enabled = false;
        config.cache.tag_ttl_secs = 60;

        let options = docs_options_from_config(&config).unwrap();

        assert_eq!(options.default_branch_ref, "refs/heads/main");
        assert!(options.tags_from_releases);
        assert_eq!(options.languages, vec!["ja".to_owned()]);
        assert!(!options.cache.enabled);
        assert_eq!(options.cache.tag_ttl, Duration::from_secs(60));
        assert!(options.docs_pattern.is_match("docs/guides/routing.md"));
    }

    #[test]
    fn test_server_config_from_config() {
        let mut config = Config::default();
        config.source_resolved.repo = "remix-run/react-router".to_owned();

        let server = server_config_from_config(&config).unwrap();

        assert_eq!(server.host, "127.0.0.1");
        assert_eq!(server.port, 7979);
        assert_eq!(server.repo.to_string(), "remix-run/react-router");
    }

    #[test]
    fn test_server_config_rejects_bad_repo() {
        let mut config = Config::default();
        config.source_resolved.repo = "not-a-repo".to_owned();

        assert!(server_config_from_config(&config).is_err());
    }
}
