//! Detection of autogenerated-content markers that were never replaced.
//!
//! Reference pages carry markers such as `<!-- AUTOGENERATED USAGE DESCRIPTIONS -->`
//! that a generation step swaps for real content. A marker that reaches the
//! rendered output means that step was skipped.

use std::path::Path;
use std::sync::LazyLock;

use dox_config::PlaceholderRule;
use glob::{MatchOptions, Pattern};
use regex::Regex;

use crate::error::BuildError;

static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--(.*?)-->").unwrap());

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

struct CompiledRule {
    pattern: Pattern,
    markers: Vec<String>,
}

/// Checks rendered pages against the configured placeholder rules.
pub struct PlaceholderVerifier {
    rules: Vec<CompiledRule>,
}

impl PlaceholderVerifier {
    /// Compile placeholder rules.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Config`] if a pattern is not a valid glob.
    pub fn new(rules: &[PlaceholderRule]) -> Result<Self, BuildError> {
        let rules = rules
            .iter()
            .map(|rule| {
                let pattern = Pattern::new(&rule.pattern).map_err(|e| {
                    BuildError::Config(format!("invalid placeholder pattern '{}': {e}", rule.pattern))
                })?;
                Ok(CompiledRule {
                    pattern,
                    markers: rule.markers.clone(),
                })
            })
            .collect::<Result<_, BuildError>>()?;
        Ok(Self { rules })
    }

    /// Markers that apply to a content-relative path. Empty for ordinary pages.
    pub fn markers_for<'a>(&'a self, rel_path: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.rules
            .iter()
            .filter(move |rule| rule.pattern.matches_with(rel_path, MATCH_OPTIONS))
            .flat_map(|rule| rule.markers.iter().map(String::as_str))
    }

    /// Fail if `rendered` still contains a marker that applies to `rel_path`.
    ///
    /// `source_path` is the document's file path, reported in the error.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnresolvedPlaceholder`] for the first surviving marker.
    pub fn verify(&self, rendered: &str, rel_path: &str, source_path: &Path) -> Result<(), BuildError> {
        let mut markers = self.markers_for(rel_path).peekable();
        if markers.peek().is_none() {
            return Ok(());
        }
        let comments: Vec<&str> = COMMENT_RE
            .captures_iter(rendered)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().trim())
            .collect();

        match markers.find(|marker| comments.contains(marker)) {
            Some(marker) => Err(BuildError::UnresolvedPlaceholder {
                marker: marker.to_owned(),
                path: source_path.to_path_buf(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use dox_config::default_placeholder_rules;

    use super::*;

    fn verifier() -> PlaceholderVerifier {
        PlaceholderVerifier::new(&default_placeholder_rules()).unwrap()
    }

    #[test]
    fn test_markers_for_command_pages() {
        let v = verifier();
        let markers: Vec<_> = v.markers_for("commands/npm-access.md").collect();
        assert_eq!(
            markers,
            vec!["AUTOGENERATED USAGE DESCRIPTIONS", "AUTOGENERATED CONFIG DESCRIPTIONS"]
        );
    }

    #[test]
    fn test_markers_for_config_reference() {
        let v = verifier();
        let markers: Vec<_> = v.markers_for("using-npm/config.md").collect();
        assert_eq!(
            markers,
            vec!["AUTOGENERATED CONFIG SHORTHANDS", "AUTOGENERATED CONFIG DESCRIPTIONS"]
        );
    }

    #[test]
    fn test_no_markers_for_prose_pages() {
        let v = verifier();
        assert_eq!(v.markers_for("using-npm/scripts.md").count(), 0);
        assert_eq!(v.markers_for("commands/nested/npm.md").count(), 0);
        assert_eq!(v.markers_for("test.md").count(), 0);
    }

    #[test]
    fn test_verify_fails_with_marker_and_path() {
        let v = verifier();
        let source = Path::new("/docs/content/commands/npm-access.md");
        let err = v
            .verify(
                "<!-- AUTOGENERATED USAGE DESCRIPTIONS -->",
                "commands/npm-access.md",
                source,
            )
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("AUTOGENERATED USAGE DESCRIPTIONS"));
        assert!(message.contains("npm-access.md"));
    }

    #[test]
    fn test_verify_config_marker_on_config_page() {
        let v = verifier();
        let err = v
            .verify(
                "<p>Intro</p>\n<!--AUTOGENERATED CONFIG SHORTHANDS-->",
                "using-npm/config.md",
                Path::new("using-npm/config.md"),
            )
            .unwrap_err();
        assert!(err.to_string().contains("config.md"));
    }

    #[test]
    fn test_verify_ignores_markers_on_other_pages() {
        let v = verifier();
        assert!(
            v.verify(
                "<!-- AUTOGENERATED USAGE DESCRIPTIONS -->",
                "using-npm/scripts.md",
                Path::new("using-npm/scripts.md"),
            )
            .is_ok()
        );
    }

    #[test]
    fn test_verify_ignores_escaped_markers() {
        let v = verifier();
        let html = "<pre><code>&lt;!-- AUTOGENERATED USAGE DESCRIPTIONS --&gt;</code></pre>";
        assert!(
            v.verify(html, "commands/npm.md", Path::new("commands/npm.md"))
                .is_ok()
        );
    }

    #[test]
    fn test_verify_other_comments_pass() {
        let v = verifier();
        let html = "<!-- automatically generated, do not edit manually -->\n<pre><code>npm access</code></pre>";
        assert!(
            v.verify(html, "commands/npm-access.md", Path::new("commands/npm-access.md"))
                .is_ok()
        );
    }

    #[test]
    fn test_invalid_pattern() {
        let rules = vec![PlaceholderRule {
            pattern: "commands/[".to_owned(),
            markers: vec!["X".to_owned()],
        }];
        let err = PlaceholderVerifier::new(&rules).err().unwrap();
        assert!(matches!(err, BuildError::Config(_)));
    }
}
