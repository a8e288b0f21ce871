//! Documentation build orchestration.
//!
//! A build loads the nav manifest and template, renders every document,
//! verifies placeholders, checks the nav against the content tree and only
//! then writes the html, man and md trees. Any error aborts the whole build
//! and leaves existing output untouched.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use dox_config::{BUILTIN_TEMPLATE_VARS, Config, ManConfig, OutputConfig, PlaceholderRule};
use rayon::prelude::*;

use crate::error::BuildError;
use crate::nav::{NavIndex, NavRenderer, load_nav};
use crate::page::{ContentRenderer, RenderedPage, SiteSettings};
use crate::placeholder::PlaceholderVerifier;
use crate::scanner::{ContentDocument, scan};
use crate::staging::{StagedTree, commit_all};
use crate::template::Template;

/// Inputs and outputs of a documentation build.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Root of the markdown content tree.
    pub content_dir: PathBuf,
    /// Nav manifest (YAML).
    pub nav: PathBuf,
    /// Page template.
    pub template: PathBuf,
    /// The three output trees.
    pub output: OutputConfig,
    pub site: SiteSettings,
    pub man: ManConfig,
    pub placeholders: Vec<PlaceholderRule>,
}

impl BuildConfig {
    /// Build configuration from a loaded `dox.toml`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            content_dir: config.docs_resolved.content_dir.clone(),
            nav: config.docs_resolved.nav.clone(),
            template: config.docs_resolved.template.clone(),
            output: config.output_resolved.clone(),
            site: SiteSettings {
                version: config.site.version.clone(),
                vars: config.site.vars.clone(),
            },
            man: config.man.clone(),
            placeholders: config.placeholders.clone(),
        }
    }
}

/// Files produced by a build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildResult {
    /// Number of markdown documents rendered.
    pub document_count: usize,
    /// Every output file: the html tree, then man, then md, each in walk order.
    pub files: Vec<PathBuf>,
}

/// Output tree a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tree {
    Html,
    Man,
    Md,
}

/// A file to write, relative to its tree.
struct PlannedFile<'a> {
    tree: Tree,
    rel_path: &'a str,
    content: &'a str,
}

/// Builds the documentation output trees.
pub struct Builder {
    config: BuildConfig,
}

impl Builder {
    #[must_use]
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Run the build and commit all three output trees.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered; nothing is written in that case.
    pub fn build(&self) -> Result<BuildResult, BuildError> {
        self.run(true)
    }

    /// Run every build step without writing any output.
    ///
    /// The returned file list is what [`build`](Self::build) would write.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`build`](Self::build).
    pub fn check(&self) -> Result<BuildResult, BuildError> {
        self.run(false)
    }

    fn run(&self, commit: bool) -> Result<BuildResult, BuildError> {
        let start = Instant::now();
        let config = &self.config;

        // Loading
        let nav = load_nav(&config.nav)?;
        let template = Template::load(&config.template)?;
        template.check_variables(|name| {
            BUILTIN_TEMPLATE_VARS.contains(&name) || config.site.vars.contains_key(name)
        })?;
        let verifier = PlaceholderVerifier::new(&config.placeholders)?;
        let documents = scan(&config.content_dir)?;
        tracing::info!(
            document_count = documents.len(),
            content_dir = %config.content_dir.display(),
            "Loaded documentation sources"
        );

        // Rendering
        let targets: HashMap<String, String> = documents
            .iter()
            .map(|doc| (doc.url(), doc.html_path()))
            .collect();
        let nav_renderer = NavRenderer::new(&nav, targets);
        let renderer = ContentRenderer::new(&template, &nav_renderer, &config.site, &config.man);

        let pages = documents
            .par_iter()
            .map(|doc| render_document(&renderer, &verifier, doc))
            .collect::<Result<Vec<_>, _>>()?;

        // Verifying
        NavIndex::from_entries(&nav).validate(
            &manifest_name(&config.nav),
            documents.iter().map(|doc| doc.rel_path.as_str()),
        )?;
        let planned = plan_outputs(&pages)?;

        let files = if commit {
            self.write_outputs(&planned)?
        } else {
            planned
                .iter()
                .map(|file| self.tree_dir(file.tree).join(file.rel_path))
                .collect()
        };

        tracing::info!(
            document_count = pages.len(),
            file_count = files.len(),
            committed = commit,
            elapsed_ms = start.elapsed().as_millis(),
            "Documentation build complete"
        );

        Ok(BuildResult {
            document_count: pages.len(),
            files,
        })
    }

    /// Stage every planned file, then commit the three trees as one group.
    ///
    /// A failed commit leaves all three previous trees in place.
    fn write_outputs(&self, planned: &[PlannedFile<'_>]) -> Result<Vec<PathBuf>, BuildError> {
        let html = StagedTree::new(&self.config.output.html_dir)?;
        let man = StagedTree::new(&self.config.output.man_dir)?;
        let md = StagedTree::new(&self.config.output.md_dir)?;

        let files = planned
            .iter()
            .map(|file| {
                let tree = match file.tree {
                    Tree::Html => &html,
                    Tree::Man => &man,
                    Tree::Md => &md,
                };
                tree.write(file.rel_path, file.content)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let targets: Vec<PathBuf> = [&html, &man, &md]
            .iter()
            .map(|tree| tree.target().to_path_buf())
            .collect();
        commit_all(vec![html, man, md])?;
        for target in targets {
            tracing::info!(path = %target.display(), "Wrote output tree");
        }
        Ok(files)
    }

    fn tree_dir(&self, tree: Tree) -> &Path {
        match tree {
            Tree::Html => &self.config.output.html_dir,
            Tree::Man => &self.config.output.man_dir,
            Tree::Md => &self.config.output.md_dir,
        }
    }
}

fn render_document(
    renderer: &ContentRenderer<'_>,
    verifier: &PlaceholderVerifier,
    doc: &ContentDocument,
) -> Result<RenderedPage, BuildError> {
    let page = renderer.render(doc)?;
    verifier.verify(&page.fragment, &page.rel_path, &page.source_path)?;
    tracing::debug!(path = %doc.rel_path, "Rendered document");
    Ok(page)
}

/// Order output files by tree and reject two documents claiming one man page.
fn plan_outputs(pages: &[RenderedPage]) -> Result<Vec<PlannedFile<'_>>, BuildError> {
    let mut planned = Vec::with_capacity(pages.len() * 3);
    planned.extend(pages.iter().map(|page| PlannedFile {
        tree: Tree::Html,
        rel_path: &page.html_path,
        content: &page.html,
    }));

    let mut man_owners: HashMap<&str, &str> = HashMap::new();
    for page in pages {
        if let Some(man) = &page.man {
            if let Some(other) = man_owners.insert(&man.path, &page.rel_path) {
                return Err(BuildError::DuplicateManPage {
                    man_path: man.path.clone(),
                    first: other.to_owned(),
                    second: page.rel_path.clone(),
                });
            }
            planned.push(PlannedFile {
                tree: Tree::Man,
                rel_path: &man.path,
                content: &man.roff,
            });
        }
    }

    planned.extend(pages.iter().map(|page| PlannedFile {
        tree: Tree::Md,
        rel_path: &page.rel_path,
        content: &page.markdown,
    }));

    Ok(planned)
}

fn manifest_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
