//! Runtime configuration, read from the environment (and `.env` via `dotenv`).

use std::env;
use std::time::Duration;

use url::Url;

use crate::error::AppError;

pub const DEFAULT_MODEL: &str = "gemini-pro";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_HISTORY_WINDOW: usize = 6;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://safedoser.sqlite";

/// Value shipped in sample `.env` files; treated the same as no key at all.
const PLACEHOLDER_API_KEY: &str = "your-api-key-here";

/// How the binary renders log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Settings for the hosted model adapter.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: Url,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// `None` selects the deterministic-only engine.
    pub provider: Option<ProviderConfig>,
    /// Number of most recent chat turns included in the model prompt.
    pub history_window: usize,
    pub database_url: String,
    pub log_format: LogFormat,
    /// Set by `load` when a `.env` file was read. Reported once logging is up.
    pub env_file_loaded: bool,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            provider: None,
            history_window: DEFAULT_HISTORY_WINDOW,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            log_format: LogFormat::Pretty,
            env_file_loaded: false,
        }
    }
}

impl AssistantConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn load() -> Result<Self, AppError> {
        let env_file_loaded = dotenv::dotenv().is_ok();
        Ok(Self {
            env_file_loaded,
            ..Self::from_env()?
        })
    }

    /// Reads configuration from the process environment only.
    pub fn from_env() -> Result<Self, AppError> {
        let provider = match read_var("GEMINI_API_KEY") {
            Some(key) if key != PLACEHOLDER_API_KEY => Some(ProviderConfig {
                api_key: key,
                model: read_var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                base_url: Url::parse(
                    &read_var("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                )?,
                timeout: Duration::from_secs(parse_var(
                    "PROVIDER_TIMEOUT_SECS",
                    DEFAULT_TIMEOUT_SECS,
                )?),
            }),
            _ => None,
        };

        let history_window = parse_var("CHAT_HISTORY_WINDOW", DEFAULT_HISTORY_WINDOW)?;

        let log_format = match read_var("LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(AppError::Config(format!(
                    "LOG_FORMAT must be 'pretty' or 'json', got '{}'",
                    other
                )))
            }
        };

        Ok(Self {
            provider,
            history_window,
            database_url: read_var("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            log_format,
            env_file_loaded: false,
        })
    }
}

/// Non-empty, trimmed value of an environment variable.
fn read_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T>(name: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match read_var(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| AppError::Config(format!("{} is invalid ('{}'): {}", name, raw, e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 7] = [
        "GEMINI_API_KEY",
        "GEMINI_MODEL",
        "GEMINI_BASE_URL",
        "PROVIDER_TIMEOUT_SECS",
        "CHAT_HISTORY_WINDOW",
        "DATABASE_URL",
        "LOG_FORMAT",
    ];

    fn with_env<F: FnOnce()>(values: &[(&str, &str)], f: F) {
        let vars: Vec<(&str, Option<&str>)> = VARS
            .iter()
            .map(|name| {
                let value = values.iter().find(|(k, _)| k == name).map(|(_, v)| *v);
                (*name, value)
            })
            .collect();
        temp_env::with_vars(vars, f);
    }

    #[test]
    fn test_defaults_without_key() {
        with_env(&[], || {
            let config = AssistantConfig::from_env().unwrap();
            assert!(config.provider.is_none());
            assert_eq!(config.history_window, 6);
            assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
            assert_eq!(config.log_format, LogFormat::Pretty);
            assert!(!config.env_file_loaded);
        });
    }

    #[test]
    fn test_placeholder_key_counts_as_absent() {
        with_env(&[("GEMINI_API_KEY", "your-api-key-here")], || {
            assert!(AssistantConfig::from_env().unwrap().provider.is_none());
        });
        with_env(&[("GEMINI_API_KEY", "   ")], || {
            assert!(AssistantConfig::from_env().unwrap().provider.is_none());
        });
    }

    #[test]
    fn test_provider_settings() {
        with_env(
            &[
                ("GEMINI_API_KEY", "secret"),
                ("GEMINI_MODEL", "gemini-1.5-flash"),
                ("PROVIDER_TIMEOUT_SECS", "12"),
                ("CHAT_HISTORY_WINDOW", "10"),
                ("LOG_FORMAT", "json"),
            ],
            || {
                let config = AssistantConfig::from_env().unwrap();
                let provider = config.provider.expect("provider configured");
                assert_eq!(provider.api_key, "secret");
                assert_eq!(provider.model, "gemini-1.5-flash");
                assert_eq!(provider.base_url.as_str(), "https://generativelanguage.googleapis.com/v1beta");
                assert_eq!(provider.timeout, Duration::from_secs(12));
                assert_eq!(config.history_window, 10);
                assert_eq!(config.log_format, LogFormat::Json);
            },
        );
    }

    #[test]
    fn test_malformed_values_are_config_errors() {
        with_env(&[("CHAT_HISTORY_WINDOW", "six")], || {
            assert!(matches!(AssistantConfig::from_env(), Err(AppError::Config(_))));
        });
        with_env(&[("GEMINI_API_KEY", "k"), ("GEMINI_BASE_URL", "not a url")], || {
            assert!(matches!(AssistantConfig::from_env(), Err(AppError::Config(_))));
        });
        with_env(&[("LOG_FORMAT", "xml")], || {
            assert!(matches!(AssistantConfig::from_env(), Err(AppError::Config(_))));
        });
    }
}
