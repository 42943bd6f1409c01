//! CLI command implementations.

pub(crate) mod menu;
pub(crate) mod resolve;
pub(crate) mod serve;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use ghdocs_config::{CliSettings, Config};
use ghdocs_server::docs_options_from_config;
use ghdocs_site::Docs;
use ghdocs_source::{GitHubHost, RepoId};

use crate::error::CliError;

pub(crate) use menu::MenuArgs;
pub(crate) use resolve::ResolveArgs;
pub(crate) use serve::ServeArgs;

/// Options shared by every command.
#[derive(Args, Debug)]
pub(crate) struct SourceArgs {
    /// Path to configuration file (default: auto-discover ghdocs.toml).
    #[arg(short, long, env = "GHDOCS_CONFIG")]
    config: Option<PathBuf>,

    /// Repository as owner/name (overrides config).
    #[arg(long, env = "GHDOCS_REPO")]
    repo: Option<String>,

    /// Working copy served as the `local` version (overrides config).
    #[arg(long, env = "GHDOCS_LOCAL_DIR")]
    local_dir: Option<PathBuf>,

    /// Disable caching: every request fetches fresh from the host.
    #[arg(long, env = "GHDOCS_NO_CACHE")]
    no_cache: bool,

    /// Enable verbose output (info-level logs).
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl SourceArgs {
    /// Build config overrides. Server address overrides come from `serve`.
    fn settings(&self, host: Option<String>, port: Option<u16>) -> CliSettings {
        CliSettings {
            host,
            port,
            repo: self.repo.clone(),
            local_dir: self.local_dir.clone(),
            cache_enabled: self.no_cache.then_some(false),
        }
    }

    /// Load and validate configuration with overrides applied.
    pub(crate) fn load(
        &self,
        host: Option<String>,
        port: Option<u16>,
    ) -> Result<Config, CliError> {
        let settings = self.settings(host, port);
        Ok(Config::load(self.config.as_deref(), Some(&settings))?)
    }
}

/// Create the documentation service for the configured repository.
pub(crate) fn open_docs(config: &Config) -> Result<(Docs, RepoId), CliError> {
    let source = &config.source_resolved;
    let repo: RepoId = source.repo.parse()?;
    tracing::debug!(repo = %repo, api_url = %source.api_url, "Opening documentation service");

    let host = Arc::new(GitHubHost::new(
        &source.api_url,
        source.token.clone(),
        source.timeout,
    ));
    let options = docs_options_from_config(config)
        .map_err(|e| CliError::Validation(format!("Invalid docs_pattern: {e}")))?;

    Ok((Docs::new(host, options), repo))
}
