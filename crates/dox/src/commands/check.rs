//! `dox check` command implementation.

use clap::Args;
use dox_build::Builder;

use super::SourceArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    #[command(flatten)]
    pub(crate) source: SourceArgs,
}

impl CheckArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.source.load(&output)?;

        let result = Builder::new(config).check()?;

        output.info(&format!(
            "{} documents, {} output files",
            result.document_count,
            result.files.len()
        ));
        output.success("Documentation is consistent");
        Ok(())
    }
}
