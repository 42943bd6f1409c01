//! `ghdocs menu` command implementation.

use clap::Args;

use crate::commands::{SourceArgs, open_docs};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the menu command.
#[derive(Args, Debug)]
pub(crate) struct MenuArgs {
    /// Version token to build the menu for.
    version: String,

    /// Language subtree (`docs/<lang>/`).
    #[arg(long)]
    lang: Option<String>,

    #[command(flatten)]
    pub(crate) source: SourceArgs,
}

impl MenuArgs {
    /// Print the navigation menu of a version as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the version is unknown, the host cannot be
    /// reached, or the documentation content is broken.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.source.load(None, None)?;
        let (docs, repo) = open_docs(&config)?;

        let git_ref = docs
            .resolve(&repo, &self.version)
            .await?
            .ok_or_else(|| {
                CliError::NotFound(format!("No version of {repo} matches '{}'", self.version))
            })?;

        let menu = docs
            .menu(&repo, &git_ref, self.lang.as_deref())
            .await?
            .ok_or_else(|| CliError::NotFound(format!("No archive for {repo} at {git_ref}")))?;

        output.success(&format!("Menu for {repo} at {git_ref}"));
        output.result(&serde_json::to_string_pretty(menu.as_slice())?)?;
        Ok(())
    }
}
