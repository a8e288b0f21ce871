//! Configuration management for dox.
//!
//! Parses `dox.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `site.version`
//! - every value in `site.vars`

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Template variables supplied by the build for every page.
///
/// `site.vars` entries may not reuse these names.
pub const BUILTIN_TEMPLATE_VARS: &[&str] = &[
    "content",
    "title",
    "description",
    "path",
    "url_path",
    "root",
    "toc",
    "nav",
    "version",
];

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override markdown content directory.
    pub content_dir: Option<PathBuf>,
    /// Override navigation manifest path.
    pub nav: Option<PathBuf>,
    /// Override page template path.
    pub template: Option<PathBuf>,
    /// Override the parent of all three output trees (`html/`, `man/`, `md/`).
    pub output_dir: Option<PathBuf>,
    /// Override the documentation version.
    pub version: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "dox.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input locations (paths are relative strings from TOML).
    docs: DocsConfigRaw,
    /// Output locations (paths are relative strings from TOML).
    output: OutputConfigRaw,
    /// Site-wide template values.
    pub site: SiteConfig,
    /// Man page generation.
    pub man: ManConfig,
    /// Placeholder category mapping.
    #[serde(rename = "placeholders")]
    placeholders_raw: Option<Vec<PlaceholderRule>>,

    /// Resolved input configuration (set after loading).
    #[serde(skip)]
    pub docs_resolved: DocsConfig,
    /// Resolved output configuration (set after loading).
    #[serde(skip)]
    pub output_resolved: OutputConfig,
    /// Placeholder rules with defaults applied (set after loading).
    #[serde(skip)]
    pub placeholders: Vec<PlaceholderRule>,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw input configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DocsConfigRaw {
    content_dir: Option<String>,
    nav: Option<String>,
    template: Option<String>,
}

/// Resolved input configuration with absolute paths.
#[derive(Debug, Clone, Default)]
pub struct DocsConfig {
    /// Root directory of the markdown content tree.
    pub content_dir: PathBuf,
    /// Navigation manifest (YAML).
    pub nav: PathBuf,
    /// Page template.
    pub template: PathBuf,
}

/// Raw output configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct OutputConfigRaw {
    html_dir: Option<String>,
    man_dir: Option<String>,
    md_dir: Option<String>,
}

/// Resolved output configuration with absolute paths.
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// HTML output tree.
    pub html_dir: PathBuf,
    /// Man page output tree.
    pub man_dir: PathBuf,
    /// Markdown pass-through output tree.
    pub md_dir: PathBuf,
}

impl OutputConfig {
    /// Place all three output trees under a single parent directory.
    #[must_use]
    pub fn under(dir: &Path) -> Self {
        Self {
            html_dir: dir.join("html"),
            man_dir: dir.join("man"),
            md_dir: dir.join("md"),
        }
    }
}

/// Site-wide values exposed to the page template.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Documentation version, exposed as `{{ version }}` and in man page headers.
    pub version: String,
    /// Extra template variables.
    pub vars: BTreeMap<String, String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            version: "0.0.0".to_owned(),
            vars: BTreeMap::new(),
        }
    }
}

/// Man page configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ManConfig {
    /// Content directories that produce man pages.
    pub sections: Vec<ManSection>,
}

impl Default for ManConfig {
    fn default() -> Self {
        Self {
            sections: vec![ManSection {
                dir: "commands".to_owned(),
                section: 1,
            }],
        }
    }
}

impl ManConfig {
    /// Man section for a content-relative path, if it lives under a man directory.
    ///
    /// Only the first path component is compared.
    #[must_use]
    pub fn section_for(&self, rel_path: &str) -> Option<u8> {
        let (top, _) = rel_path.split_once('/')?;
        self.sections
            .iter()
            .find(|s| s.dir.trim_matches('/') == top)
            .map(|s| s.section)
    }
}

/// Maps a top-level content directory to a man section number.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ManSection {
    /// Directory relative to the content root (e.g. `commands`).
    pub dir: String,
    /// Man section number (1-9).
    pub section: u8,
}

/// Placeholder markers that must not survive in documents matching `pattern`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PlaceholderRule {
    /// Glob over content-relative paths (e.g. `commands/*.md`).
    pub pattern: String,
    /// Marker names, matched as `<!-- NAME -->` in the output.
    pub markers: Vec<String>,
}

impl PlaceholderRule {
    fn new(pattern: &str, markers: &[&str]) -> Self {
        Self {
            pattern: pattern.to_owned(),
            markers: markers.iter().map(|&m| m.to_owned()).collect(),
        }
    }
}

/// Placeholder rules used when the config has no `[[placeholders]]` entries.
#[must_use]
pub fn default_placeholder_rules() -> Vec<PlaceholderRule> {
    vec![
        PlaceholderRule::new(
            "commands/*.md",
            &[
                "AUTOGENERATED USAGE DESCRIPTIONS",
                "AUTOGENERATED CONFIG DESCRIPTIONS",
            ],
        ),
        PlaceholderRule::new(
            "using-npm/config.md",
            &[
                "AUTOGENERATED CONFIG SHORTHANDS",
                "AUTOGENERATED CONFIG DESCRIPTIONS",
            ],
        ),
    ]
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`site.version`").
        field: String,
        /// Error message (e.g., "${`DOCS_VERSION`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `dox.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(content_dir) = &settings.content_dir {
            self.docs_resolved.content_dir.clone_from(content_dir);
        }
        if let Some(nav) = &settings.nav {
            self.docs_resolved.nav.clone_from(nav);
        }
        if let Some(template) = &settings.template {
            self.docs_resolved.template.clone_from(template);
        }
        if let Some(output_dir) = &settings.output_dir {
            self.output_resolved = OutputConfig::under(output_dir);
        }
        if let Some(version) = &settings.version {
            self.site.version.clone_from(version);
        }
    }

    /// Man section for a content-relative path, if it belongs to a man directory.
    #[must_use]
    pub fn man_section_for(&self, rel_path: &str) -> Option<u8> {
        self.man.section_for(rel_path)
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            docs: DocsConfigRaw::default(),
            output: OutputConfigRaw::default(),
            site: SiteConfig::default(),
            man: ManConfig::default(),
            placeholders_raw: None,
            docs_resolved: DocsConfig {
                content_dir: base.join("docs/content"),
                nav: base.join("docs/nav.yml"),
                template: base.join("docs/template.html"),
            },
            output_resolved: OutputConfig::under(&base.join("docs/output")),
            placeholders: default_placeholder_rules(),
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_site()?;
        self.validate_man()?;
        self.validate_placeholders()?;
        Ok(())
    }

    /// Validate site configuration.
    fn validate_site(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.site.version, "site.version")?;
        for name in self.site.vars.keys() {
            if BUILTIN_TEMPLATE_VARS.contains(&name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "site.vars.{name} shadows a built-in template variable"
                )));
            }
        }
        Ok(())
    }

    /// Validate man section mapping.
    fn validate_man(&self) -> Result<(), ConfigError> {
        for section in &self.man.sections {
            require_non_empty(&section.dir, "man.sections.dir")?;
            if !(1..=9).contains(&section.section) {
                return Err(ConfigError::Validation(format!(
                    "man section for {} must be between 1 and 9, got {}",
                    section.dir, section.section
                )));
            }
        }
        Ok(())
    }

    /// Validate placeholder rules.
    fn validate_placeholders(&self) -> Result<(), ConfigError> {
        for rule in &self.placeholders {
            glob::Pattern::new(&rule.pattern).map_err(|e| {
                ConfigError::Validation(format!(
                    "placeholders.pattern {:?} is not a valid glob: {e}",
                    rule.pattern
                ))
            })?;
            if rule.markers.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "placeholders rule {:?} has no markers",
                    rule.pattern
                )));
            }
            for marker in &rule.markers {
                require_non_empty(marker, "placeholders.markers")?;
            }
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.site.version = expand::expand_env(&self.site.version, "site.version")?;
        for (name, value) in &mut self.site.vars {
            *value = expand::expand_env(value, &format!("site.vars.{name}"))?;
        }
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.docs_resolved = DocsConfig {
            content_dir: resolve(self.docs.content_dir.as_deref(), "docs/content"),
            nav: resolve(self.docs.nav.as_deref(), "docs/nav.yml"),
            template: resolve(self.docs.template.as_deref(), "docs/template.html"),
        };

        self.output_resolved = OutputConfig {
            html_dir: resolve(self.output.html_dir.as_deref(), "docs/output/html"),
            man_dir: resolve(self.output.man_dir.as_deref(), "docs/output/man"),
            md_dir: resolve(self.output.md_dir.as_deref(), "docs/output/md"),
        };

        self.placeholders = match &self.placeholders_raw {
            Some(rules) => rules.clone(),
            None => default_placeholder_rules(),
        };
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(
            config.docs_resolved.content_dir,
            PathBuf::from("/test/docs/content")
        );
        assert_eq!(config.docs_resolved.nav, PathBuf::from("/test/docs/nav.yml"));
        assert_eq!(
            config.docs_resolved.template,
            PathBuf::from("/test/docs/template.html")
        );
        assert_eq!(
            config.output_resolved.man_dir,
            PathBuf::from("/test/docs/output/man")
        );
        assert_eq!(config.site.version, "0.0.0");
        assert_eq!(config.placeholders, default_placeholder_rules());
        assert_eq!(config.man_section_for("commands/npm-access.md"), Some(1));
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.site.version, "0.0.0");
        assert_eq!(config.man.sections.len(), 1);
        assert!(config.placeholders_raw.is_none());
    }

    #[test]
    fn test_parse_site_config() {
        let toml = r#"
[site]
version = "10.9.0"

[site.vars]
github_repo = "acme/cli"
github_branch = "latest"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.site.version, "10.9.0");
        assert_eq!(config.site.vars["github_repo"], "acme/cli");
        assert_eq!(config.site.vars["github_branch"], "latest");
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[docs]
content_dir = "content"
nav = "lib/nav.yml"

[output]
html_dir = "dist/web"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.docs_resolved.content_dir,
            PathBuf::from("/project/content")
        );
        assert_eq!(config.docs_resolved.nav, PathBuf::from("/project/lib/nav.yml"));
        assert_eq!(
            config.docs_resolved.template,
            PathBuf::from("/project/docs/template.html")
        );
        assert_eq!(
            config.output_resolved.html_dir,
            PathBuf::from("/project/dist/web")
        );
        assert_eq!(
            config.output_resolved.md_dir,
            PathBuf::from("/project/docs/output/md")
        );
    }

    #[test]
    fn test_explicit_placeholders_replace_defaults() {
        let toml = r#"
[[placeholders]]
pattern = "reference/*.md"
markers = ["AUTOGENERATED API TABLE"]
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.placeholders,
            vec![PlaceholderRule::new(
                "reference/*.md",
                &["AUTOGENERATED API TABLE"]
            )]
        );
    }

    #[test]
    fn test_man_sections() {
        let toml = r#"
[[man.sections]]
dir = "commands"
section = 1

[[man.sections]]
dir = "configuring-npm"
section = 5
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.man_section_for("commands/npm.md"), Some(1));
        assert_eq!(config.man_section_for("configuring-npm/npmrc.md"), Some(5));
        assert_eq!(config.man_section_for("using-npm/config.md"), None);
        // A file named like the directory is not inside it
        assert_eq!(config.man_section_for("commands.md"), None);
    }

    #[test]
    fn test_apply_cli_settings_output_dir() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            output_dir: Some(PathBuf::from("/tmp/out")),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.output_resolved.html_dir, PathBuf::from("/tmp/out/html"));
        assert_eq!(config.output_resolved.man_dir, PathBuf::from("/tmp/out/man"));
        assert_eq!(config.output_resolved.md_dir, PathBuf::from("/tmp/out/md"));
        // Unchanged
        assert_eq!(
            config.docs_resolved.content_dir,
            PathBuf::from("/test/docs/content")
        );
    }

    #[test]
    fn test_apply_cli_settings_inputs_and_version() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            content_dir: Some(PathBuf::from("/src/content")),
            nav: Some(PathBuf::from("/src/nav.yml")),
            template: Some(PathBuf::from("/src/page.html")),
            version: Some("11.0.0".to_owned()),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.docs_resolved.content_dir, PathBuf::from("/src/content"));
        assert_eq!(config.docs_resolved.nav, PathBuf::from("/src/nav.yml"));
        assert_eq!(config.docs_resolved.template, PathBuf::from("/src/page.html"));
        assert_eq!(config.site.version, "11.0.0");
    }

    #[test]
    fn test_expand_env_vars_site() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("DOX_CFG_TEST_VERSION", "9.9.9");
            std::env::set_var("DOX_CFG_TEST_REPO", "acme/tools");
        }

        let toml = r#"
[site]
version = "${DOX_CFG_TEST_VERSION}"

[site.vars]
github_repo = "${DOX_CFG_TEST_REPO}"
github_branch = "${DOX_CFG_TEST_BRANCH:-main}"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();

        assert_eq!(config.site.version, "9.9.9");
        assert_eq!(config.site.vars["github_repo"], "acme/tools");
        assert_eq!(config.site.vars["github_branch"], "main");

        unsafe {
            std::env::remove_var("DOX_CFG_TEST_VERSION");
            std::env::remove_var("DOX_CFG_TEST_REPO");
        }
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            r#"
[docs]
content_dir = "content"

[site]
version = "1.2.3"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.docs_resolved.content_dir, dir.path().join("content"));
        assert_eq!(config.site.version, "1.2.3");
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let err = Config::load(Some(Path::new("/nonexistent/dox.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    // Validation tests

    /// Assert that validation fails with expected substrings in the error message.
    fn assert_validation_error(config: &Config, expected_substrings: &[&str]) {
        let result = config.validate();
        assert!(result.is_err(), "Expected validation to fail");
        let err = result.unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        let msg = err.to_string();
        for s in expected_substrings {
            assert!(
                msg.contains(s),
                "Expected error to contain '{s}', got: {msg}"
            );
        }
    }

    #[test]
    fn test_validate_default_config_passes() {
        let config = Config::default_with_base(Path::new("/test"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_version() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.site.version = String::new();
        assert_validation_error(&config, &["site.version", "empty"]);
    }

    #[test]
    fn test_validate_var_shadows_builtin() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config
            .site
            .vars
            .insert("content".to_owned(), "oops".to_owned());
        assert_validation_error(&config, &["site.vars.content", "built-in"]);
    }

    #[test]
    fn test_validate_man_section_range() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.man.sections.push(ManSection {
            dir: "reference".to_owned(),
            section: 12,
        });
        assert_validation_error(&config, &["reference", "between 1 and 9"]);
    }

    #[test]
    fn test_validate_invalid_glob() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.placeholders = vec![PlaceholderRule::new("commands/[*.md", &["X"])];
        assert_validation_error(&config, &["commands/[*.md", "glob"]);
    }

    #[test]
    fn test_validate_rule_without_markers() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.placeholders = vec![PlaceholderRule::new("commands/*.md", &[])];
        assert_validation_error(&config, &["no markers"]);
    }
}
