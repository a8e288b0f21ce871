//! Environment variable expansion for configuration strings.
//!
//! Supports:
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default

use crate::ConfigError;

/// Expand environment variable references in a string.
///
/// Supports:
/// - `${VAR}` - expands to the value of VAR, errors if unset
/// - `${VAR:-default}` - expands to VAR if set, otherwise uses default
///
/// Returns the original string unchanged if no `${}` patterns are present.
/// Bare `$VAR` syntax is not expanded (only `${VAR}` with braces).
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, LookupError> {
        match std::env::var(var) {
            Ok(val) => Ok(Some(val)),
            Err(_) => Err(LookupError {
                var_name: var.to_owned(),
            }),
        }
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{0}}} not set", e.cause.var_name),
    })
}

/// Error returned when environment variable lookup fails.
struct LookupError {
    var_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_version_from_env() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("DOX_TEST_VERSION", "10.2.0");
        }
        let result = expand_env("${DOX_TEST_VERSION}", "site.version").unwrap();
        assert_eq!(result, "10.2.0");
        unsafe {
            std::env::remove_var("DOX_TEST_VERSION");
        }
    }

    #[test]
    fn test_expand_default_when_unset() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("DOX_UNSET_VERSION");
        }
        let result = expand_env("${DOX_UNSET_VERSION:-0.0.0}", "site.version").unwrap();
        assert_eq!(result, "0.0.0");
    }

    #[test]
    fn test_expand_missing_var_names_field() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("DOX_MISSING_REPO");
        }
        let err = expand_env("${DOX_MISSING_REPO}", "site.vars.github_repo").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("DOX_MISSING_REPO"));
        assert!(err.to_string().contains("site.vars.github_repo"));
    }

    #[test]
    fn test_expand_embedded_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("DOX_TEST_ORG", "acme");
        }
        let result = expand_env("https://github.com/${DOX_TEST_ORG}/cli", "site.vars.repo").unwrap();
        assert_eq!(result, "https://github.com/acme/cli");
        unsafe {
            std::env::remove_var("DOX_TEST_ORG");
        }
    }

    #[test]
    fn test_literal_and_bare_dollar_unchanged() {
        assert_eq!(expand_env("1.0.0", "site.version").unwrap(), "1.0.0");
        assert_eq!(expand_env("$VERSION", "site.version").unwrap(), "$VERSION");
    }
}
