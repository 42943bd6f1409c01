//! ghdocs CLI - versioned documentation for GitHub repositories.
//!
//! Provides commands for:
//! - `serve`: Start the documentation API server
//! - `resolve`: Print the git ref a version token resolves to
//! - `menu`: Print the navigation menu of a version as JSON

mod commands;
mod error;
mod output;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{MenuArgs, ResolveArgs, ServeArgs, SourceArgs};
use error::CliError;
use output::Output;

/// ghdocs - versioned documentation for GitHub repositories.
#[derive(Parser)]
#[command(name = "ghdocs", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the documentation server.
    Serve(ServeArgs),
    /// Resolve a version token to a git ref.
    Resolve(ResolveArgs),
    /// Print the navigation menu of a version.
    Menu(MenuArgs),
}

impl Commands {
    fn source(&self) -> &SourceArgs {
        match self {
            Self::Serve(args) => &args.source,
            Self::Resolve(args) => &args.source,
            Self::Menu(args) => &args.source,
        }
    }

    async fn execute(self) -> Result<(), CliError> {
        match self {
            Self::Serve(args) => args.execute().await,
            Self::Resolve(args) => args.execute().await,
            Self::Menu(args) => args.execute().await,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.command.source().verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = tokio::runtime::Runtime::new()
        .map_err(CliError::from)
        .and_then(|rt| rt.block_on(cli.command.execute()));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output.error(&format!("Error: {err}"));
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_menu() {
        let cli = Cli::try_parse_from([
            "ghdocs",
            "menu",
            "v6",
            "--lang",
            "es",
            "--repo",
            "remix-run/react-router",
            "--verbose",
        ])
        .unwrap();

        assert!(cli.command.source().verbose);
        assert!(matches!(cli.command, Commands::Menu(ref args) if args.source.verbose));
    }

    #[test]
    fn test_parse_serve_no_cache() {
        let cli = Cli::try_parse_from(["ghdocs", "serve", "--no-cache", "--port", "9000"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve(_)));
    }
}
