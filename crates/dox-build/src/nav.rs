//! Navigation manifest: parsing, URL normalisation and consistency checks.
//!
//! The manifest is a YAML sequence of entries:
//!
//! ```yaml
//! - title: CLI Commands
//!   url: /commands
//!   children:
//!     - title: npm access
//!       url: /commands/npm-access
//!       description: Set access level on published packages
//! ```
//!
//! Every markdown file must have exactly one entry and every entry must
//! have a file. Order matters for rendering only.

use std::collections::{BTreeSet, HashMap};
use std::fmt::{self, Write};
use std::path::Path;

use dox_renderer::{escape_html, relative_path};
use serde::Deserialize;

use crate::error::BuildError;

/// One page in the navigation tree.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NavEntry {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub children: Vec<NavEntry>,
}

impl NavEntry {
    /// Display title, falling back to the last URL segment.
    #[must_use]
    pub fn display_title(&self) -> &str {
        match &self.title {
            Some(title) => title,
            None => self
                .url
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .filter(|s| !s.is_empty())
                .unwrap_or("/"),
        }
    }
}

/// Parse a nav manifest. An empty document yields no entries.
///
/// # Errors
///
/// Returns [`BuildError::ManifestParse`] naming `path` if the YAML is malformed.
pub fn parse_nav(content: &str, path: &Path) -> Result<Vec<NavEntry>, BuildError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    serde_yaml::from_str(trimmed).map_err(|e| BuildError::parse(path, format!("Invalid YAML: {e}")))
}

/// Read and parse a nav manifest file.
///
/// # Errors
///
/// Returns [`BuildError::Io`] if the file cannot be read, or
/// [`BuildError::ManifestParse`] if it is malformed.
pub fn load_nav(path: &Path) -> Result<Vec<NavEntry>, BuildError> {
    let content = std::fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
    parse_nav(&content, path)
}

/// Normalise a URL: leading `/`, no trailing `/`, `\` treated as `/`,
/// repeated separators collapsed. The site root is `/`.
#[must_use]
pub fn normalize_url(url: &str) -> String {
    let segments: Vec<&str> = url
        .split(['/', '\\'])
        .filter(|s| !s.is_empty())
        .collect();
    format!("/{}", segments.join("/"))
}

/// Map a content-relative markdown path to its page URL.
///
/// - `index.md` -> `/`
/// - `commands/npm-access.md` -> `/commands/npm-access`
/// - `configuring-npm/index.md` -> `/configuring-npm`
#[must_use]
pub fn content_path_to_url(rel_path: &str) -> String {
    let normalized = normalize_url(rel_path);
    let without_ext = normalized.strip_suffix(".md").unwrap_or(&normalized);
    let path_part = if without_ext == "/index" {
        "/"
    } else if let Some(parent) = without_ext.strip_suffix("/index") {
        parent
    } else {
        without_ext
    };
    path_part.to_owned()
}

/// Flat set of every URL in a nav tree, including nested entries.
#[derive(Debug, Default)]
pub struct NavIndex {
    urls: BTreeSet<String>,
    duplicates: BTreeSet<String>,
}

impl NavIndex {
    #[must_use]
    pub fn from_entries(entries: &[NavEntry]) -> Self {
        let mut index = Self::default();
        index.collect(entries);
        index
    }

    fn collect(&mut self, entries: &[NavEntry]) {
        for entry in entries {
            let url = normalize_url(&entry.url);
            if !self.urls.insert(url.clone()) {
                self.duplicates.insert(url);
            }
            self.collect(&entry.children);
        }
    }

    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Check that the nav and the content tree describe the same pages.
    ///
    /// `content_paths` are markdown paths relative to the content root.
    ///
    /// # Errors
    ///
    /// Returns a [`NavMismatch`] listing every URL without a file, every
    /// file without a URL, and every URL claimed more than once.
    pub fn validate<'a>(
        &self,
        manifest_name: &str,
        content_paths: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), NavMismatch> {
        let mut content_urls = BTreeSet::new();
        let mut duplicates = self.duplicates.clone();
        for path in content_paths {
            let url = content_path_to_url(path);
            if !content_urls.insert(url.clone()) {
                duplicates.insert(url);
            }
        }

        let mismatch = NavMismatch {
            manifest: manifest_name.to_owned(),
            missing_from_nav: content_urls.difference(&self.urls).cloned().collect(),
            missing_files: self.urls.difference(&content_urls).cloned().collect(),
            duplicates: duplicates.into_iter().collect(),
        };
        if mismatch.is_empty() {
            Ok(())
        } else {
            Err(mismatch)
        }
    }
}

/// Validate a nav tree against content paths.
///
/// # Errors
///
/// See [`NavIndex::validate`].
pub fn validate<'a>(
    entries: &[NavEntry],
    manifest_name: &str,
    content_paths: impl IntoIterator<Item = &'a str>,
) -> Result<(), NavMismatch> {
    NavIndex::from_entries(entries).validate(manifest_name, content_paths)
}

/// Every disagreement between the nav manifest and the content tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavMismatch {
    /// Manifest file name, for the error message.
    pub manifest: String,
    /// Content pages with no nav entry.
    pub missing_from_nav: Vec<String>,
    /// Nav entries with no content file.
    pub missing_files: Vec<String>,
    /// URLs listed twice in the nav, or produced by two content files.
    pub duplicates: Vec<String>,
}

impl NavMismatch {
    fn is_empty(&self) -> bool {
        self.missing_from_nav.is_empty()
            && self.missing_files.is_empty()
            && self.duplicates.is_empty()
    }
}

impl fmt::Display for NavMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Documentation navigation ({}) does not match filesystem",
            self.manifest
        )?;
        for url in &self.missing_from_nav {
            write!(f, "\n  file not in nav: {url}")?;
        }
        for url in &self.missing_files {
            write!(f, "\n  nav entry without file: {url}")?;
        }
        for url in &self.duplicates {
            write!(f, "\n  duplicate url: {url}")?;
        }
        Ok(())
    }
}

impl std::error::Error for NavMismatch {}

/// Renders the nav tree as nested `<ul>` lists for one page.
///
/// Links are relative to the page, so the output tree can be served from
/// any prefix or opened from disk.
pub struct NavRenderer<'a> {
    entries: &'a [NavEntry],
    /// Normalised URL -> HTML output path (e.g. `/commands` -> `commands/index.html`).
    targets: HashMap<String, String>,
}

impl<'a> NavRenderer<'a> {
    #[must_use]
    pub fn new(entries: &'a [NavEntry], targets: HashMap<String, String>) -> Self {
        Self { entries, targets }
    }

    /// Render the tree for the page at `page_path` (output path without
    /// extension) whose URL is `current_url`.
    #[must_use]
    pub fn render(&self, current_url: &str, page_path: &str) -> String {
        if self.entries.is_empty() {
            return String::new();
        }
        let mut html = String::with_capacity(1024);
        html.push_str("<ul class=\"nav\">\n");
        self.render_items(&mut html, self.entries, current_url, page_path);
        html.push_str("</ul>");
        html
    }

    fn render_items(&self, html: &mut String, items: &[NavEntry], current_url: &str, page_path: &str) {
        for item in items {
            let url = normalize_url(&item.url);
            let is_active = url == current_url;
            let href = relative_path(page_path, &self.target_for(&url));

            if is_active {
                html.push_str("<li class=\"active\">");
            } else {
                html.push_str("<li>");
            }
            let _ = write!(html, "<a href=\"{}\"", escape_html(&href));
            if is_active {
                html.push_str(" aria-current=\"page\"");
            }
            if let Some(description) = &item.description {
                let _ = write!(html, " title=\"{}\"", escape_html(description));
            }
            let _ = write!(html, ">{}</a>", escape_html(item.display_title()));

            if !item.children.is_empty() {
                html.push_str("\n<ul>\n");
                self.render_items(html, &item.children, current_url, page_path);
                html.push_str("</ul>\n");
            }
            html.push_str("</li>\n");
        }
    }

    fn target_for(&self, url: &str) -> String {
        match self.targets.get(url) {
            Some(target) => target.clone(),
            None if url == "/" => "index.html".to_owned(),
            None => format!("{}.html", url.trim_start_matches('/')),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn entry(url: &str, children: Vec<NavEntry>) -> NavEntry {
        NavEntry {
            url: url.to_owned(),
            title: None,
            description: None,
            children,
        }
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("/commands/npm-access"), "/commands/npm-access");
        assert_eq!(normalize_url("commands/npm-access/"), "/commands/npm-access");
        assert_eq!(normalize_url("\\commands\\npm"), "/commands/npm");
        assert_eq!(normalize_url("//a//b"), "/a/b");
        assert_eq!(normalize_url("/"), "/");
        assert_eq!(normalize_url(""), "/");
    }

    #[test]
    fn test_content_path_to_url() {
        assert_eq!(content_path_to_url("test.md"), "/test");
        assert_eq!(content_path_to_url("commands/npm-access.md"), "/commands/npm-access");
        assert_eq!(content_path_to_url("configuring-npm/index.md"), "/configuring-npm");
        assert_eq!(content_path_to_url("index.md"), "/");
        assert_eq!(content_path_to_url("using-npm\\config.md"), "/using-npm/config");
        assert_eq!(content_path_to_url("reindex.md"), "/reindex");
    }

    #[test]
    fn test_parse_nav() {
        let yaml = "- title: CLI Commands\n  url: /commands\n  children:\n    - url: /commands/npm-access\n      description: Set access level\n";
        let entries = parse_nav(yaml, Path::new("nav.yml")).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title.as_deref(), Some("CLI Commands"));
        assert_eq!(entries[0].children[0].url, "/commands/npm-access");
        assert_eq!(
            entries[0].children[0].description.as_deref(),
            Some("Set access level")
        );
    }

    #[test]
    fn test_parse_nav_empty() {
        assert!(parse_nav("", Path::new("nav.yml")).unwrap().is_empty());
    }

    #[test]
    fn test_parse_nav_requires_url() {
        let err = parse_nav("- title: No url\n", Path::new("nav.yml")).unwrap_err();
        assert!(matches!(err, BuildError::ManifestParse { .. }));
        assert!(err.to_string().contains("nav.yml"));
    }

    #[test]
    fn test_parse_nav_malformed() {
        let err = parse_nav("- url: [unclosed", Path::new("nav.yml")).unwrap_err();
        assert!(matches!(err, BuildError::ManifestParse { .. }));
    }

    #[test]
    fn test_index_flattens_nested_entries() {
        let entries = vec![
            entry("/commands", vec![entry("/commands/npm", vec![]), entry("/commands/npm-ci/", vec![])]),
            entry("/", vec![]),
        ];
        let index = NavIndex::from_entries(&entries);
        assert_eq!(index.len(), 4);
        assert!(index.contains("/commands/npm-ci"));
        assert!(index.contains("/"));
    }

    #[test]
    fn test_validate_exact_match() {
        let entries = vec![
            entry("/", vec![]),
            entry("/commands", vec![entry("/commands/npm-access", vec![])]),
        ];
        let paths = ["index.md", "commands/index.md", "commands/npm-access.md"];
        assert!(validate(&entries, "nav.yml", paths).is_ok());
    }

    #[test]
    fn test_validate_reports_both_directions() {
        let entries = vec![entry("/test2", vec![])];
        let err = validate(&entries, "nav.yml", ["test.md"]).unwrap_err();
        assert_eq!(err.missing_from_nav, vec!["/test"]);
        assert_eq!(err.missing_files, vec!["/test2"]);
        assert!(
            err.to_string()
                .starts_with("Documentation navigation (nav.yml) does not match filesystem")
        );
    }

    #[test]
    fn test_validate_extra_nav_entry_only() {
        let entries = vec![entry("/test", vec![]), entry("/extra", vec![])];
        let err = validate(&entries, "nav.yml", ["test.md"]).unwrap_err();
        assert!(err.missing_from_nav.is_empty());
        assert_eq!(err.missing_files, vec!["/extra"]);
    }

    #[test]
    fn test_validate_reports_every_mismatch() {
        let err = validate(&[], "nav.yml", ["a.md", "b/c.md", "d.md"]).unwrap_err();
        assert_eq!(err.missing_from_nav, vec!["/a", "/b/c", "/d"]);
    }

    #[test]
    fn test_validate_duplicates() {
        let entries = vec![entry("/a", vec![entry("/a/", vec![])])];
        let err = validate(&entries, "nav.yml", ["a.md"]).unwrap_err();
        assert_eq!(err.duplicates, vec!["/a"]);

        let entries = vec![entry("/a", vec![])];
        let err = validate(&entries, "nav.yml", ["a.md", "a/index.md"]).unwrap_err();
        assert_eq!(err.duplicates, vec!["/a"]);
    }

    #[test]
    fn test_display_title_fallback() {
        assert_eq!(entry("/commands/npm-ci", vec![]).display_title(), "npm-ci");
        assert_eq!(entry("/", vec![]).display_title(), "/");
    }

    #[test]
    fn test_render_nav_relative_links_and_active() {
        let entries = vec![
            NavEntry {
                title: Some("Home".to_owned()),
                ..entry("/", vec![])
            },
            NavEntry {
                title: Some("CLI Commands".to_owned()),
                ..entry("/commands", vec![entry("/commands/npm-access", vec![])])
            },
        ];
        let targets = HashMap::from([
            ("/".to_owned(), "index.html".to_owned()),
            ("/commands".to_owned(), "commands/index.html".to_owned()),
            ("/commands/npm-access".to_owned(), "commands/npm-access.html".to_owned()),
        ]);
        let renderer = NavRenderer::new(&entries, targets);
        let html = renderer.render("/commands/npm-access", "commands/npm-access");
        assert_eq!(
            html,
            concat!(
                "<ul class=\"nav\">\n",
                "<li><a href=\"../index.html\">Home</a></li>\n",
                "<li><a href=\"index.html\">CLI Commands</a>\n",
                "<ul>\n",
                "<li class=\"active\"><a href=\"npm-access.html\" aria-current=\"page\">npm-access</a></li>\n",
                "</ul>\n",
                "</li>\n",
                "</ul>",
            )
        );
    }

    #[test]
    fn test_render_nav_empty() {
        let renderer = NavRenderer::new(&[], HashMap::new());
        assert_eq!(renderer.render("/", "index"), "");
    }
}
