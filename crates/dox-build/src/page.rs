//! Per-document rendering: HTML page, optional man page, markdown copy.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::PathBuf;

use dox_config::ManConfig;
use dox_renderer::{
    HtmlBackend, ManHeader, ManRenderer, MarkdownRenderer, TocEntry, escape_html, relative_path,
    split_front_matter,
};

use crate::error::BuildError;
use crate::nav::NavRenderer;
use crate::scanner::ContentDocument;
use crate::template::{Template, TemplateContext};

/// A roff man page for one document.
#[derive(Debug, Clone)]
pub struct ManPage {
    /// Path relative to the man root (e.g. `man1/npm-access.1`).
    pub path: String,
    pub roff: String,
}

/// All outputs of one document, ready to be written.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub rel_path: String,
    pub source_path: PathBuf,
    /// HTML fragment produced from the markdown body, before templating.
    pub fragment: String,
    /// Path relative to the HTML root.
    pub html_path: String,
    /// Complete page after template substitution.
    pub html: String,
    pub man: Option<ManPage>,
    /// Original markdown, front matter included.
    pub markdown: String,
}

/// Site-wide values shared by every page.
#[derive(Debug, Clone, Default)]
pub struct SiteSettings {
    pub version: String,
    pub vars: BTreeMap<String, String>,
}

/// Renders documents into HTML pages and man pages.
pub struct ContentRenderer<'a> {
    template: &'a Template,
    nav: &'a NavRenderer<'a>,
    site: &'a SiteSettings,
    man: &'a ManConfig,
}

impl<'a> ContentRenderer<'a> {
    #[must_use]
    pub fn new(
        template: &'a Template,
        nav: &'a NavRenderer<'a>,
        site: &'a SiteSettings,
        man: &'a ManConfig,
    ) -> Self {
        Self {
            template,
            nav,
            site,
            man,
        }
    }

    /// Render one document.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::ManifestParse`] for malformed front matter and
    /// [`BuildError::UnresolvedVariable`] if the template needs a value that
    /// is not supplied.
    pub fn render(&self, doc: &ContentDocument) -> Result<RenderedPage, BuildError> {
        let (front, body) = split_front_matter(&doc.markdown)
            .map_err(|e| BuildError::parse(&doc.source_path, e.to_string()))?;

        let page_path = doc.page_path();
        let result = MarkdownRenderer::<HtmlBackend>::new()
            .with_title_extraction()
            .with_page_path(page_path)
            .render_markdown(body);

        let title = front
            .title
            .clone()
            .or(result.title)
            .unwrap_or_else(|| doc.stem().to_owned());
        let description = front.description.clone().unwrap_or_default();
        let url = doc.url();

        let mut context: TemplateContext = self
            .site
            .vars
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        context.insert("content", result.html.as_str());
        context.insert("title", escape_html(&title));
        context.insert("description", escape_html(&description));
        context.insert("path", doc.rel_path.as_str());
        context.insert("url_path", url.as_str());
        context.insert("root", relative_path(page_path, ""));
        context.insert("toc", render_toc(&result.toc));
        context.insert("nav", self.nav.render(&url, page_path));
        context.insert("version", self.site.version.as_str());

        let html = self.template.render(&context)?;

        // Index pages are section landing pages, not command references
        let man_section = self
            .man
            .section_for(&doc.rel_path)
            .filter(|_| doc.stem() != "index");
        let man = match man_section {
            Some(default_section) => {
                let section = front.section.unwrap_or(default_section);
                if !(1..=9).contains(&section) {
                    return Err(BuildError::parse(
                        &doc.source_path,
                        format!("man section must be between 1 and 9, got {section}"),
                    ));
                }
                let roff = ManRenderer::new(ManHeader {
                    name: doc.stem().to_owned(),
                    section,
                    version: self.site.version.clone(),
                    description: front.description,
                })
                .render_markdown(body);
                Some(ManPage {
                    path: format!("man{section}/{}.{section}", doc.stem()),
                    roff,
                })
            }
            None => None,
        };

        Ok(RenderedPage {
            rel_path: doc.rel_path.clone(),
            source_path: doc.source_path.clone(),
            fragment: result.html,
            html_path: doc.html_path(),
            html,
            man,
            markdown: doc.markdown.clone(),
        })
    }
}

/// Render the page's table of contents as a flat list. Empty when there are no headings.
fn render_toc(toc: &[TocEntry]) -> String {
    if toc.is_empty() {
        return String::new();
    }
    let mut html = String::from("<ul class=\"toc\">\n");
    for entry in toc {
        let _ = writeln!(
            html,
            "<li class=\"toc-level-{}\"><a href=\"#{}\">{}</a></li>",
            entry.level,
            escape_html(&entry.id),
            escape_html(&entry.title),
        );
    }
    html.push_str("</ul>");
    html
}
