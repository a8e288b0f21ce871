//! Content tree discovery.
//!
//! Walks the content root in sorted order and reads every markdown file.
//! Hidden files and directories are skipped; non-markdown files are ignored.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::BuildError;
use crate::nav::content_path_to_url;

/// A markdown source file.
#[derive(Debug, Clone)]
pub struct ContentDocument {
    /// Path relative to the content root, `/` separated (e.g. `commands/npm-access.md`).
    pub rel_path: String,
    /// Absolute path of the source file.
    pub source_path: PathBuf,
    /// Raw file contents, front matter included.
    pub markdown: String,
}

impl ContentDocument {
    /// Page URL (e.g. `/commands/npm-access`).
    #[must_use]
    pub fn url(&self) -> String {
        content_path_to_url(&self.rel_path)
    }

    /// Output path without extension (e.g. `commands/npm-access`).
    #[must_use]
    pub fn page_path(&self) -> &str {
        self.rel_path.strip_suffix(".md").unwrap_or(&self.rel_path)
    }

    /// File stem (e.g. `npm-access`).
    #[must_use]
    pub fn stem(&self) -> &str {
        let page = self.page_path();
        page.rsplit('/').next().unwrap_or(page)
    }

    /// HTML output path relative to the HTML root.
    #[must_use]
    pub fn html_path(&self) -> String {
        format!("{}.html", self.page_path())
    }
}

/// Collect every markdown document under `content_dir`.
///
/// Order is deterministic: entries are sorted by file name at each level,
/// and files come before subdirectories.
///
/// # Errors
///
/// Returns [`BuildError::Io`] if the directory or a file cannot be read.
pub fn scan(content_dir: &Path) -> Result<Vec<ContentDocument>, BuildError> {
    let mut documents = Vec::new();
    scan_directory(content_dir, "", &mut documents)?;
    Ok(documents)
}

fn scan_directory(
    dir_path: &Path,
    rel_prefix: &str,
    documents: &mut Vec<ContentDocument>,
) -> Result<(), BuildError> {
    let entries = fs::read_dir(dir_path).map_err(|e| BuildError::io(dir_path, e))?;

    let mut files = Vec::new();
    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| BuildError::io(dir_path, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        // Symlinks are not followed into directories
        let file_type = entry.file_type().map_err(|e| BuildError::io(&path, e))?;
        if file_type.is_dir() {
            dirs.push((name, path));
        } else if path.extension().is_some_and(|e| e == "md") {
            files.push((name, path));
        } else {
            tracing::debug!(path = %path.display(), "Skipping non-markdown file");
        }
    }
    files.sort();
    dirs.sort();

    for (name, path) in files {
        let markdown = fs::read_to_string(&path).map_err(|e| BuildError::io(&path, e))?;
        documents.push(ContentDocument {
            rel_path: join_rel(rel_prefix, &name),
            source_path: path,
            markdown,
        });
    }
    for (name, path) in dirs {
        scan_directory(&path, &join_rel(rel_prefix, &name), documents)?;
    }
    Ok(())
}

fn join_rel(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_owned()
    } else {
        format!("{prefix}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_scan_sorted_and_nested() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "using-npm/scripts.md", "# scripts");
        write(dir.path(), "commands/npm.md", "# npm");
        write(dir.path(), "commands/npm-access.md", "# npm-access");
        write(dir.path(), "index.md", "# Home");

        let docs = scan(dir.path()).unwrap();
        let paths: Vec<_> = docs.iter().map(|d| d.rel_path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "index.md",
                "commands/npm-access.md",
                "commands/npm.md",
                "using-npm/scripts.md",
            ]
        );
        assert_eq!(docs[1].markdown, "# npm-access");
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_does_not_follow_directory_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "commands/npm.md", "# npm");
        std::os::unix::fs::symlink(dir.path(), dir.path().join("commands/loop")).unwrap();

        let docs = scan(dir.path()).unwrap();
        let paths: Vec<_> = docs.iter().map(|d| d.rel_path.as_str()).collect();
        assert_eq!(paths, vec!["commands/npm.md"]);
    }

    #[test]
    fn test_scan_skips_hidden_and_non_markdown() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "test.md", "");
        write(dir.path(), ".hidden.md", "");
        write(dir.path(), ".git/config.md", "");
        write(dir.path(), "logo.png", "");

        let docs = scan(dir.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].rel_path, "test.md");
    }

    #[test]
    fn test_scan_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_scan_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = scan(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, BuildError::Io { .. }));
    }

    #[test]
    fn test_document_paths() {
        let doc = ContentDocument {
            rel_path: "commands/npm-access.md".to_owned(),
            source_path: PathBuf::from("/docs/commands/npm-access.md"),
            markdown: String::new(),
        };
        assert_eq!(doc.url(), "/commands/npm-access");
        assert_eq!(doc.page_path(), "commands/npm-access");
        assert_eq!(doc.stem(), "npm-access");
        assert_eq!(doc.html_path(), "commands/npm-access.html");

        let index = ContentDocument {
            rel_path: "configuring-npm/index.md".to_owned(),
            ..doc
        };
        assert_eq!(index.url(), "/configuring-npm");
        assert_eq!(index.html_path(), "configuring-npm/index.html");
    }
}
