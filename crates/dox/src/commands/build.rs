//! `dox build` command implementation.

use clap::Args;
use dox_build::Builder;

use super::SourceArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    #[command(flatten)]
    pub(crate) source: SourceArgs,
}

impl BuildArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.source.load(&output)?;
        output.path("Output", config.output.html_dir.parent().unwrap_or(&config.output.html_dir));

        let result = Builder::new(config).build()?;

        output.success(&format!(
            "Built {} documents into {} files",
            result.document_count,
            result.files.len()
        ));
        Ok(())
    }
}
