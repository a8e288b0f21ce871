//! Render backend trait for format-specific rendering.
//!
//! The generic [`MarkdownRenderer`](crate::MarkdownRenderer) handles block
//! structure and inline formatting; the backend decides how code blocks,
//! blockquotes and images are written and how link targets are rewritten
//! for the page's output location.

use std::borrow::Cow;

/// Backend trait for format-specific rendering operations.
pub trait RenderBackend {
    /// Render a code block.
    ///
    /// # Arguments
    ///
    /// * `lang` - Optional language identifier (e.g., "bash", "json")
    /// * `content` - The code content
    /// * `out` - Output buffer to write to
    fn code_block(lang: Option<&str>, content: &str, out: &mut String);

    /// Render blockquote start tag.
    fn blockquote_start(out: &mut String);

    /// Render blockquote end tag.
    fn blockquote_end(out: &mut String);

    /// Render an image. `src` has already been through [`transform_image_src`](Self::transform_image_src).
    fn image(src: &str, alt: &str, title: &str, out: &mut String);

    /// Transform a hyperlink `href`.
    ///
    /// `page_path` is the page's output path without extension, relative to
    /// the output root (e.g. `commands/npm-access`). Default returns the URL
    /// unchanged.
    #[must_use]
    fn transform_link<'a>(url: &'a str, _page_path: Option<&str>) -> Cow<'a, str> {
        Cow::Borrowed(url)
    }

    /// Transform an image `src`. Default returns the source unchanged.
    #[must_use]
    fn transform_image_src<'a>(src: &'a str, _page_path: Option<&str>) -> Cow<'a, str> {
        Cow::Borrowed(src)
    }

    /// Render a hard break.
    fn hard_break(out: &mut String) {
        out.push_str("<br>");
    }

    /// Render a horizontal rule.
    fn horizontal_rule(out: &mut String) {
        out.push_str("<hr>");
    }

    /// Render a task list marker.
    fn task_list_marker(checked: bool, out: &mut String) {
        if checked {
            out.push_str(r#"<input type="checkbox" checked disabled> "#);
        } else {
            out.push_str(r#"<input type="checkbox" disabled> "#);
        }
    }
}
