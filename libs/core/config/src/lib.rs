pub mod tracing;

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is required but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },
}

impl ConfigError {
    /// Build a parse error for `key` from any displayable cause
    pub fn parse(key: &str, details: impl Display) -> Self {
        ConfigError::ParseError {
            key: key.to_string(),
            details: details.to_string(),
        }
    }
}

/// Application environment, selects the log format
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        if app_env.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Trait for configuration that can be loaded from environment variables
pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

/// Load an environment variable, falling back to `default` when unset
pub fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Load an environment variable or return `MissingEnvVar`
pub fn env_required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Load an optional environment variable; empty values count as unset
pub fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Load and parse an environment variable, using `default` when unset
pub fn env_parse<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match env_optional(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ConfigError::parse(key, e)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_defaults_to_development() {
        temp_env::with_var_unset("APP_ENV", || {
            let env = Environment::from_env();
            assert_eq!(env, Environment::Development);
            assert!(env.is_development());
            assert!(!env.is_production());
        });
    }

    #[test]
    fn test_environment_production_case_insensitive() {
        temp_env::with_var("APP_ENV", Some("PRODUCTION"), || {
            assert_eq!(Environment::from_env(), Environment::Production);
        });

        temp_env::with_var("APP_ENV", Some("staging"), || {
            assert_eq!(Environment::from_env(), Environment::Development);
        });
    }

    #[test]
    fn test_env_or_default() {
        temp_env::with_var("MAILER_TEST_VAR", Some("value"), || {
            assert_eq!(env_or_default("MAILER_TEST_VAR", "fallback"), "value");
        });
        temp_env::with_var_unset("MAILER_TEST_VAR", || {
            assert_eq!(env_or_default("MAILER_TEST_VAR", "fallback"), "fallback");
        });
    }

    #[test]
    fn test_env_required_missing() {
        temp_env::with_var_unset("MAILER_REQUIRED", || {
            let err = env_required("MAILER_REQUIRED").unwrap_err();
            assert!(err.to_string().contains("MAILER_REQUIRED"));
            assert!(err.to_string().contains("required"));
        });
    }

    #[test]
    fn test_env_optional_treats_blank_as_unset() {
        temp_env::with_var("MAILER_OPTIONAL", Some("   "), || {
            assert_eq!(env_optional("MAILER_OPTIONAL"), None);
        });
        temp_env::with_var("MAILER_OPTIONAL", Some("set"), || {
            assert_eq!(env_optional("MAILER_OPTIONAL").as_deref(), Some("set"));
        });
    }

    #[test]
    fn test_env_parse_default_and_value() {
        temp_env::with_var_unset("MAILER_PACING", || {
            assert_eq!(env_parse("MAILER_PACING", 200u64).unwrap(), 200);
        });
        temp_env::with_var("MAILER_PACING", Some(" 350 "), || {
            assert_eq!(env_parse("MAILER_PACING", 200u64).unwrap(), 350);
        });
    }

    #[test]
    fn test_env_parse_invalid_names_the_key() {
        temp_env::with_var("MAILER_PACING", Some("fast"), || {
            let err = env_parse("MAILER_PACING", 200u64).unwrap_err();
            assert!(matches!(err, ConfigError::ParseError { .. }));
            assert!(err.to_string().contains("MAILER_PACING"));
        });
    }
}
