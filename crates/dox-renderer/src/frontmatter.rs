//! YAML front matter at the top of markdown documents.
//!
//! ```text
//! ---
//! title: npm-access
//! section: 1
//! description: Set access level on published packages
//! ---
//! ```
//!
//! Unknown keys are accepted and ignored. A leading `---` with no closing
//! delimiter, or one enclosing something other than a YAML mapping, is a
//! thematic break and stays in the body.

use serde::Deserialize;

/// Page-level values declared in front matter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct FrontMatter {
    /// Page title (overrides H1 extraction).
    #[serde(default)]
    pub title: Option<String>,

    /// One-line summary, used for the man page NAME section.
    #[serde(default)]
    pub description: Option<String>,

    /// Man section override.
    #[serde(default)]
    pub section: Option<u8>,
}

/// Error type for front matter parsing.
#[derive(Debug, thiserror::Error)]
pub enum FrontMatterError {
    /// YAML parsing error.
    #[error("{0}")]
    Parse(String),
}

/// Split a document into its front matter and markdown body.
///
/// Documents without a leading `---` line return default front matter and
/// the whole text as body.
///
/// # Errors
///
/// Returns an error if the YAML is malformed.
pub fn split_front_matter(source: &str) -> Result<(FrontMatter, &str), FrontMatterError> {
    let source_no_bom = source.strip_prefix('\u{feff}').unwrap_or(source);
    let Some(rest) = strip_delimiter_line(source_no_bom) else {
        return Ok((FrontMatter::default(), source));
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok(match parse_yaml(yaml)? {
                Some(front) => (front, body),
                None => (FrontMatter::default(), source),
            });
        }
        offset += line.len();
    }

    Ok((FrontMatter::default(), source))
}

/// Return the text after an opening `---` line, if the document starts with one.
fn strip_delimiter_line(source: &str) -> Option<&str> {
    let rest = source.strip_prefix("---")?;
    rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))
}

/// Parse the block between delimiters. `None` when it is not a mapping.
fn parse_yaml(content: &str) -> Result<Option<FrontMatter>, FrontMatterError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Ok(Some(FrontMatter::default()));
    }

    let invalid = |e: serde_yaml::Error| FrontMatterError::Parse(format!("Invalid YAML: {e}"));
    match serde_yaml::from_str::<serde_yaml::Value>(trimmed).map_err(invalid)? {
        value @ serde_yaml::Value::Mapping(_) => {
            serde_yaml::from_value(value).map(Some).map_err(invalid)
        }
        _ => Ok(None),
    }
}
