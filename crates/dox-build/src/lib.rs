//! Documentation build pipeline.
//!
//! Turns a markdown content tree, a nav manifest and a page template into
//! three output trees:
//!
//! - `html/`: one templated page per markdown file
//! - `man/`: roff man pages for command reference documents
//! - `md/`: the markdown sources, copied unchanged
//!
//! The build is all-or-nothing. Every document is rendered and checked for
//! leftover placeholder markers, the nav manifest is compared with the
//! content tree, and only then are the output trees replaced.
//!
//! # Example
//!
//! ```no_run
//! use dox_build::{BuildConfig, Builder};
//! use dox_config::Config;
//!
//! let config = Config::load(None, None)?;
//! let result = Builder::new(BuildConfig::from_config(&config)).build()?;
//! println!("wrote {} files", result.files.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod builder;
mod error;
mod nav;
mod page;
mod placeholder;
mod scanner;
mod staging;
mod template;

pub use builder::{BuildConfig, BuildResult, Builder};
pub use error::BuildError;
pub use nav::{
    NavEntry, NavIndex, NavMismatch, NavRenderer, content_path_to_url, load_nav, normalize_url,
    parse_nav, validate,
};
pub use page::{ContentRenderer, ManPage, RenderedPage, SiteSettings};
pub use placeholder::PlaceholderVerifier;
pub use scanner::{ContentDocument, scan};
pub use staging::{StagedTree, commit_all};
pub use template::{Template, TemplateContext, TemplateSyntaxError};
