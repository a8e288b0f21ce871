//! CLI command implementations.

mod build;
mod check;

use std::path::PathBuf;

use clap::Args;
use dox_build::BuildConfig;
use dox_config::{CliSettings, Config};

use crate::error::CliError;
use crate::output::Output;

pub(crate) use build::BuildArgs;
pub(crate) use check::CheckArgs;

/// Input and output locations shared by `build` and `check`.
#[derive(Args, Debug)]
pub(crate) struct SourceArgs {
    /// Path to configuration file (default: auto-discover dox.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Markdown content directory (overrides config).
    #[arg(long)]
    content_dir: Option<PathBuf>,

    /// Nav manifest (overrides config).
    #[arg(long)]
    nav: Option<PathBuf>,

    /// Page template (overrides config).
    #[arg(long)]
    template: Option<PathBuf>,

    /// Parent directory for the html, man and md trees (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Documentation version shown in pages and man headers (overrides config).
    #[arg(long = "docs-version", env = "DOX_VERSION")]
    version: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl SourceArgs {
    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            content_dir: self.content_dir.clone(),
            nav: self.nav.clone(),
            template: self.template.clone(),
            output_dir: self.output_dir.clone(),
            version: self.version.clone(),
        }
    }

    /// Load `dox.toml` with CLI overrides applied and report the inputs.
    pub(crate) fn load(&self, output: &Output) -> Result<BuildConfig, CliError> {
        let config = Config::load(self.config.as_deref(), Some(&self.cli_settings()))?;
        if let Some(path) = &config.config_path {
            output.path("Config", path);
        }
        output.path("Content", &config.docs_resolved.content_dir);
        output.path("Nav", &config.docs_resolved.nav);
        output.path("Template", &config.docs_resolved.template);
        Ok(BuildConfig::from_config(&config))
    }
}
