//! Environment variable interpolation for config files.
//!
//! Supports the following syntax:
//! - `$VAR` or `${VAR}` - substitute with env var value, error if missing
//! - `${VAR:-default}` - use default if VAR is unset or empty
//! - `$$` - escape sequence for literal `$`

use regex::Regex;
use std::env;
use std::sync::LazyLock;

/// Matches `$$`, `${VAR}` with an optional `:-default`, and bare `$VAR`.
static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        \$\$                           # Escape sequence $$
        |
        \$\{                           # Opening ${
            ([A-Za-z_][A-Za-z0-9_]*)   # Variable name (capture group 1)
            (?:
                :-                     # Default separator
                ([^}]*)                # Default value (capture group 2)
            )?
        \}                             # Closing }
        |
        \$([A-Za-z_][A-Za-z0-9_]*)     # Unbraced $VAR (capture group 3)
        ",
    )
    .expect("Invalid regex pattern")
});

/// Result of environment variable interpolation.
#[derive(Debug)]
pub struct InterpolationResult {
    /// The interpolated text.
    pub text: String,
    /// Any errors encountered during interpolation.
    pub errors: Vec<String>,
}

impl InterpolationResult {
    /// Returns true if there were no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Interpolate environment variables in the given text.
///
/// All errors are accumulated so the user sees every missing variable at
/// once rather than fixing them one restart at a time.
pub fn interpolate(input: &str) -> InterpolationResult {
    let mut errors = Vec::new();

    let text = ENV_VAR_PATTERN
        .replace_all(input, |caps: &regex::Captures| {
            let full_match = caps.get(0).map(|m| m.as_str()).unwrap_or("");

            if full_match == "$$" {
                return "$".to_string();
            }

            let var_name = caps
                .get(1)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .unwrap_or("");
            let default_value = caps.get(2).map(|m| m.as_str());

            match env::var(var_name) {
                Ok(value) if value.contains('\n') || value.contains('\r') => {
                    errors.push(format!(
                        "environment variable '{}' contains newlines, which is not allowed",
                        var_name
                    ));
                    full_match.to_string()
                }
                Ok(value) if value.is_empty() => match default_value {
                    Some(default) => default.to_string(),
                    None => value,
                },
                Ok(value) => value,
                Err(_) => match default_value {
                    Some(default) => default.to_string(),
                    None => {
                        errors.push(format!("environment variable '{}' is not set", var_name));
                        full_match.to_string()
                    }
                },
            }
        })
        .to_string();

    InterpolationResult { text, errors }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn with_env_vars<F, R>(vars: &[(&str, Option<&str>)], f: F) -> R
    where
        F: FnOnce() -> R,
    {
        // Save original values
        let originals: Vec<_> = vars.iter().map(|(k, _)| (*k, env::var(k).ok())).collect();

        // SAFETY: These tests run serially (not in parallel) and we restore values after
        for (key, value) in vars {
            match value {
                Some(v) => unsafe { env::set_var(key, v) },
                None => unsafe { env::remove_var(key) },
            }
        }

        let result = f();

        // SAFETY: Restoring original environment state
        for (key, original) in originals {
            match original {
                Some(v) => unsafe { env::set_var(key, v) },
                None => unsafe { env::remove_var(key) },
            }
        }

        result
    }

    #[test]
    fn test_basic_substitution() {
        with_env_vars(&[("FLOE_TEST_BASIC", Some("nats://queue:4222"))], || {
            let result = interpolate("url: $FLOE_TEST_BASIC");
            assert!(result.is_ok());
            assert_eq!(result.text, "url: nats://queue:4222");
        });
    }

    #[test]
    fn test_braced_substitution() {
        with_env_vars(&[("FLOE_TEST_BRACED", Some("archive-bucket"))], || {
            let result = interpolate("path: s3://${FLOE_TEST_BRACED}/records");
            assert!(result.is_ok());
            assert_eq!(result.text, "path: s3://archive-bucket/records");
        });
    }

    #[test]
    fn test_missing_variable_error() {
        with_env_vars(&[("FLOE_TEST_MISSING", None)], || {
            let result = interpolate("url: $FLOE_TEST_MISSING");
            assert!(!result.is_ok());
            assert_eq!(result.errors.len(), 1);
            assert!(result.errors[0].contains("FLOE_TEST_MISSING"));
            assert!(result.errors[0].contains("not set"));
        });
    }

    #[test]
    fn test_multiple_missing_variables() {
        with_env_vars(
            &[("FLOE_TEST_MISS1", None), ("FLOE_TEST_MISS2", None)],
            || {
                let result = interpolate("a: $FLOE_TEST_MISS1, b: $FLOE_TEST_MISS2");
                assert!(!result.is_ok());
                assert_eq!(result.errors.len(), 2);
            },
        );
    }

    #[test]
    fn test_default_value_when_unset() {
        with_env_vars(&[("FLOE_TEST_UNSET", None)], || {
            let result = interpolate("interval: ${FLOE_TEST_UNSET:-10}");
            assert!(result.is_ok());
            assert_eq!(result.text, "interval: 10");
        });
    }

    #[test]
    fn test_default_value_when_empty() {
        with_env_vars(&[("FLOE_TEST_EMPTY", Some(""))], || {
            let result = interpolate("address: ${FLOE_TEST_EMPTY:-0.0.0.0:8000}");
            assert!(result.is_ok());
            assert_eq!(result.text, "address: 0.0.0.0:8000");
        });
    }

    #[test]
    fn test_set_variable_wins_over_default() {
        with_env_vars(&[("FLOE_TEST_SET", Some("actual"))], || {
            let result = interpolate("value: ${FLOE_TEST_SET:-default}");
            assert!(result.is_ok());
            assert_eq!(result.text, "value: actual");
        });
    }

    #[test]
    fn test_escape_sequence() {
        let result = interpolate("literal: $$HOME");
        assert!(result.is_ok());
        assert_eq!(result.text, "literal: $HOME");
    }

    #[test]
    fn test_newline_injection_blocked() {
        with_env_vars(&[("FLOE_TEST_INJECT", Some("line1\nline2"))], || {
            let result = interpolate("value: $FLOE_TEST_INJECT");
            assert!(!result.is_ok());
            assert!(result.errors[0].contains("newlines"));
        });
    }

    #[test]
    fn test_no_interpolation_needed() {
        let result = interpolate("plain text without variables");
        assert!(result.is_ok());
        assert_eq!(result.text, "plain text without variables");
    }

    #[test]
    fn test_yaml_config_example() {
        with_env_vars(
            &[
                ("FLOE_TEST_QUEUE_URL", Some("nats://queue:4222")),
                ("FLOE_TEST_BUCKET", Some("archive")),
                ("FLOE_TEST_INTERVAL", None),
            ],
            || {
                let yaml = r#"
queue:
  url: ${FLOE_TEST_QUEUE_URL}
storage:
  path: "s3://${FLOE_TEST_BUCKET}/records"
poll_interval_secs: ${FLOE_TEST_INTERVAL:-10}
"#;
                let result = interpolate(yaml);
                assert!(result.is_ok());
                assert!(result.text.contains("url: nats://queue:4222"));
                assert!(result.text.contains("s3://archive/records"));
                assert!(result.text.contains("poll_interval_secs: 10"));
            },
        );
    }
}
