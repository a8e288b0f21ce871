//! HTML backend for markdown rendering.
//!
//! Produces semantic HTML5 output for static pages.

use std::borrow::Cow;
use std::fmt::Write;

use crate::backend::RenderBackend;
use crate::state::escape_html;
use crate::util::relative_path;

/// Extension of generated HTML pages, appended to extensionless link targets.
const PAGE_EXTENSION: &str = ".html";

/// HTML render backend.
///
/// Produces semantic HTML5 with:
/// - `<pre><code>` for code blocks
/// - `<blockquote>` for blockquotes
/// - `<img>` for images
/// - Root-relative link and image rewriting relative to the page location
pub struct HtmlBackend;

impl RenderBackend for HtmlBackend {
    fn code_block(lang: Option<&str>, content: &str, out: &mut String) {
        if let Some(lang) = lang {
            let _ = write!(
                out,
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                escape_html(lang),
                escape_html(content)
            );
        } else {
            let _ = write!(out, "<pre><code>{}</code></pre>", escape_html(content));
        }
    }

    fn blockquote_start(out: &mut String) {
        out.push_str("<blockquote>");
    }

    fn blockquote_end(out: &mut String) {
        out.push_str("</blockquote>");
    }

    fn image(src: &str, alt: &str, title: &str, out: &mut String) {
        let title_attr = if title.is_empty() {
            String::new()
        } else {
            format!(r#" title="{}""#, escape_html(title))
        };
        let _ = write!(
            out,
            r#"<img src="{}"{title_attr} alt="{}">"#,
            escape_html(src),
            escape_html(alt)
        );
    }

    fn transform_link<'a>(url: &'a str, page_path: Option<&str>) -> Cow<'a, str> {
        match page_path {
            Some(page) if is_root_relative(url) => Cow::Owned(rewrite_root_relative(url, page, true)),
            _ => Cow::Borrowed(url),
        }
    }

    fn transform_image_src<'a>(src: &'a str, page_path: Option<&str>) -> Cow<'a, str> {
        match page_path {
            Some(page) if is_root_relative(src) => Cow::Owned(rewrite_root_relative(src, page, false)),
            _ => Cow::Borrowed(src),
        }
    }
}

/// A root-relative path begins with a single `/`.
///
/// Protocol-relative URLs (`//host/path`) are absolute and excluded.
fn is_root_relative(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//")
}

/// Rewrite a root-relative URL so it resolves from `page_path`.
///
/// `page_path` is the page's output path without extension
/// (e.g. `commands/npm-access` for `commands/npm-access.html`).
///
/// For page links (`as_page == true`) an extensionless target gets `.html`
/// and a directory target (`/`, `/commands/`) gets `index.html`:
/// - `/test` from `commands/npm-access` → `../test.html`
/// - `/commands/` from `index` → `commands/index.html`
/// - `/using-npm/config#flags` from `commands/npm` → `../using-npm/config.html#flags`
///
/// Images keep their path as-is. Query strings and fragments are preserved.
fn rewrite_root_relative(url: &str, page_path: &str, as_page: bool) -> String {
    let (path_part, suffix) = match url.find(['?', '#']) {
        Some(pos) => (&url[..pos], &url[pos..]),
        None => (url, ""),
    };

    let trimmed = path_part.trim_start_matches('/');
    let target = if !as_page {
        trimmed.to_owned()
    } else if trimmed.is_empty() || trimmed.ends_with('/') {
        format!("{trimmed}index{PAGE_EXTENSION}")
    } else if has_extension(trimmed) {
        trimmed.to_owned()
    } else {
        format!("{trimmed}{PAGE_EXTENSION}")
    };

    format!("{}{suffix}", relative_path(page_path, &target))
}

/// Check whether the last path segment carries a file extension.
fn has_extension(path: &str) -> bool {
    path.rsplit('/')
        .next()
        .is_some_and(|segment| segment.rfind('.').is_some_and(|dot| dot > 0))
}
