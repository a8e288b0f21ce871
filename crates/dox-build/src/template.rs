//! Page template with `{{ name }}` variable markers.
//!
//! Substitution is single-pass: values are inserted verbatim and never
//! scanned for further markers.

use std::collections::HashMap;
use std::ops::Range;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::BuildError;

static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.-]*)\s*\}\}").unwrap());

/// A single `{{ name }}` occurrence.
#[derive(Debug, Clone)]
struct Marker {
    span: Range<usize>,
    name: String,
}

/// Syntax error found while parsing a template.
#[derive(Debug, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct TemplateSyntaxError {
    pub line: usize,
    pub message: String,
}

/// Parsed page template.
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
    markers: Vec<Marker>,
}

impl Template {
    /// Parse template text.
    ///
    /// # Errors
    ///
    /// Returns an error if a `{{` does not open a well-formed marker.
    pub fn parse(source: impl Into<String>) -> Result<Self, TemplateSyntaxError> {
        let source = source.into();
        let mut markers = Vec::new();
        let mut cursor = 0;

        for caps in MARKER_RE.captures_iter(&source) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            check_no_open_brace(&source, cursor..whole.start())?;
            markers.push(Marker {
                span: whole.range(),
                name: name.as_str().to_owned(),
            });
            cursor = whole.end();
        }
        check_no_open_brace(&source, cursor..source.len())?;

        Ok(Self { source, markers })
    }

    /// Read and parse a template file.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Io`] if the file cannot be read and
    /// [`BuildError::ManifestParse`] if it is malformed.
    pub fn load(path: &Path) -> Result<Self, BuildError> {
        let source = std::fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        Self::parse(source).map_err(|e| BuildError::parse(path, e.to_string()))
    }

    /// Names referenced by the template, in order of first appearance.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        let mut seen = Vec::new();
        self.markers.iter().filter_map(move |m| {
            if seen.contains(&m.name.as_str()) {
                None
            } else {
                seen.push(m.name.as_str());
                Some(m.name.as_str())
            }
        })
    }

    /// Fail if the template references any name for which `is_known` is false.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnresolvedVariable`] with the literal marker text
    /// of the first unknown name.
    pub fn check_variables(&self, is_known: impl Fn(&str) -> bool) -> Result<(), BuildError> {
        match self.markers.iter().find(|m| !is_known(&m.name)) {
            Some(marker) => Err(self.unresolved(marker)),
            None => Ok(()),
        }
    }

    /// Substitute every marker with its value from `context`.
    ///
    /// A template without markers is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnresolvedVariable`] if a marker has no value.
    pub fn render(&self, context: &TemplateContext) -> Result<String, BuildError> {
        let mut out = String::with_capacity(self.source.len() + context.total_len());
        let mut cursor = 0;
        for marker in &self.markers {
            let value = context
                .get(&marker.name)
                .ok_or_else(|| self.unresolved(marker))?;
            out.push_str(&self.source[cursor..marker.span.start]);
            out.push_str(value);
            cursor = marker.span.end;
        }
        out.push_str(&self.source[cursor..]);
        Ok(out)
    }

    fn unresolved(&self, marker: &Marker) -> BuildError {
        BuildError::UnresolvedVariable {
            marker: self.source[marker.span.clone()].to_owned(),
        }
    }
}

fn check_no_open_brace(source: &str, range: Range<usize>) -> Result<(), TemplateSyntaxError> {
    let start = range.start;
    match source[range].find("{{") {
        Some(pos) => {
            let offset = start + pos;
            let line = source[..offset].matches('\n').count() + 1;
            Err(TemplateSyntaxError {
                line,
                message: "`{{` does not open a valid `{{ name }}` marker".to_owned(),
            })
        }
        None => Ok(()),
    }
}

/// Variable values for rendering one page.
#[derive(Debug, Default, Clone)]
pub struct TemplateContext {
    vars: HashMap<String, String>,
}

impl TemplateContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    fn total_len(&self) -> usize {
        self.vars.values().map(String::len).sum()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TemplateContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
