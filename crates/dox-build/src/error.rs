//! Build error types.

use std::path::{Path, PathBuf};

use crate::nav::NavMismatch;

/// Error returned by the documentation build.
///
/// Every variant is fatal: the build stops and no output is committed.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Nav manifest, template or front matter could not be parsed.
    #[error("Failed to parse {}: {message}", path.display())]
    ManifestParse { path: PathBuf, message: String },

    /// Nav manifest and content tree describe different sets of pages.
    #[error("{0}")]
    NavMismatch(NavMismatch),

    /// Template references a variable the build does not supply.
    #[error("Template variable {marker} is not defined")]
    UnresolvedVariable { marker: String },

    /// Rendered output still contains an autogenerated content marker.
    #[error("Unresolved placeholder <!-- {marker} --> in {}", path.display())]
    UnresolvedPlaceholder { marker: String, path: PathBuf },

    /// Two documents render to the same man page.
    #[error("Man page {man_path} is produced by both {first} and {second}")]
    DuplicateManPage {
        man_path: String,
        first: String,
        second: String,
    },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid build configuration (e.g. a malformed placeholder pattern).
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BuildError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn parse(path: &Path, message: impl Into<String>) -> Self {
        Self::ManifestParse {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

impl From<NavMismatch> for BuildError {
    fn from(mismatch: NavMismatch) -> Self {
        Self::NavMismatch(mismatch)
    }
}
