//! `ghdocs resolve` command implementation.

use clap::Args;

use crate::commands::{SourceArgs, open_docs};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the resolve command.
#[derive(Args, Debug)]
pub(crate) struct ResolveArgs {
    /// Version token: a branch, a tag, or a semver prefix such as `v6` or `6.4`.
    token: String,

    #[command(flatten)]
    pub(crate) source: SourceArgs,
}

impl ResolveArgs {
    /// Print the git ref a version token resolves to.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing matches or the host cannot be reached.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let config = self.source.load(None, None)?;
        let (docs, repo) = open_docs(&config)?;

        let git_ref = docs
            .resolve(&repo, &self.token)
            .await?
            .ok_or_else(|| {
                CliError::NotFound(format!("No version of {repo} matches '{}'", self.token))
            })?;

        Output::new().result(&git_ref)?;
        Ok(())
    }
}
