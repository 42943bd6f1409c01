//! `ghdocs serve` command implementation.

use clap::Args;
use ghdocs_server::{run_server, server_config_from_config};

use crate::commands::{SourceArgs, open_docs};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args, Debug)]
pub(crate) struct ServeArgs {
    #[command(flatten)]
    pub(crate) source: SourceArgs,

    /// Host to bind to (overrides config).
    #[arg(long, env = "GHDOCS_HOST")]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long, env = "GHDOCS_PORT")]
    port: Option<u16>,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let config = self.source.load(self.host, self.port)?;
        let server_config = server_config_from_config(&config)?;
        let (docs, _) = open_docs(&config)?;

        output.highlight(&format!(
            "Serving {} on http://{}:{}",
            server_config.repo, server_config.host, server_config.port
        ));
        output.info(&format!("Source host: {}", config.source_resolved.api_url));

        if let Some(dir) = &config.source_resolved.local_dir {
            output.info(&format!("Local version: {}", dir.display()));
        }

        if config.cache.enabled {
            output.info("Cache: enabled");
        } else {
            output.info("Cache: disabled (every request fetches fresh)");
        }

        run_server(server_config, docs)
            .await
            .map_err(|e| CliError::Server(e.to_string()))?;

        Ok(())
    }
}
