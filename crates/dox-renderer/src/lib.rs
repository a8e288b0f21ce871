//! Markdown rendering for documentation pages.
//!
//! This crate provides a generic [`MarkdownRenderer`] that produces HTML
//! fragments through the [`RenderBackend`] trait, and a [`ManRenderer`]
//! that produces roff man pages from the same markdown.
//!
//! # Architecture
//!
//! Shared functionality (tables, lists, inline formatting, heading ids) is
//! handled by the generic renderer, while format-specific elements (code
//! blocks, blockquotes, images, link targets) are delegated to the backend:
//! - [`HtmlBackend`]: semantic HTML5, with root-relative links rewritten
//!   relative to the page's output location
//!
//! # Example
//!
//! ```
//! use dox_renderer::{HtmlBackend, MarkdownRenderer};
//!
//! let result = MarkdownRenderer::<HtmlBackend>::new()
//!     .with_title_extraction()
//!     .with_page_path("commands/npm-access")
//!     .render_markdown("# npm-access\n\nSee [config](/using-npm/config).");
//!
//! assert_eq!(result.title.as_deref(), Some("npm-access"));
//! assert!(result.html.contains(r#"href="../using-npm/config.html""#));
//! ```

mod backend;
mod frontmatter;
mod html;
mod man;
mod renderer;
mod state;
mod util;

pub use backend::RenderBackend;
pub use frontmatter::{FrontMatter, FrontMatterError, split_front_matter};
pub use html::HtmlBackend;
pub use man::{ManHeader, ManRenderer};
pub use renderer::{MarkdownRenderer, RenderResult};
pub use state::{TocEntry, escape_html, slugify};
pub use util::relative_path;
