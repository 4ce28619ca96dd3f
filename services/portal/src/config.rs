//! services/portal/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::time::Duration;
use tracing::Level;
use url::Url;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: Url,
    pub log_level: Level,
    pub user_agent: String,
    /// No timeout unless one is configured; the HTTP client default applies.
    pub http_timeout: Option<Duration>,
    pub search_debounce: Duration,
    pub status_ttl: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Backend ---
        let api_base_str =
            lookup("PORTAL_API_URL").unwrap_or_else(|| "http://localhost:5000".to_string());
        let api_base_url = Url::parse(&api_base_str).map_err(|e| {
            ConfigError::InvalidValue("PORTAL_API_URL".to_string(), e.to_string())
        })?;
        if api_base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidValue(
                "PORTAL_API_URL".to_string(),
                format!("'{}' cannot be used as a base URL", api_base_str),
            ));
        }

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let user_agent = lookup("PORTAL_USER_AGENT")
            .unwrap_or_else(|| format!("study-portal/{}", env!("CARGO_PKG_VERSION")));

        let http_timeout = match lookup("PORTAL_HTTP_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(parse_number(
                "PORTAL_HTTP_TIMEOUT_SECS",
                &raw,
            )?)),
            None => None,
        };

        // --- Dashboard timing ---
        let search_debounce = match lookup("PORTAL_SEARCH_DEBOUNCE_MS") {
            Some(raw) => Duration::from_millis(parse_number("PORTAL_SEARCH_DEBOUNCE_MS", &raw)?),
            None => Duration::from_millis(500),
        };

        let status_ttl_secs = match lookup("PORTAL_STATUS_TTL_SECS") {
            Some(raw) => parse_number("PORTAL_STATUS_TTL_SECS", &raw)?,
            None => 3,
        };
        if !(3..=5).contains(&status_ttl_secs) {
            return Err(ConfigError::InvalidValue(
                "PORTAL_STATUS_TTL_SECS".to_string(),
                format!("{} is outside the 3-5 second range", status_ttl_secs),
            ));
        }

        Ok(Self {
            api_base_url,
            log_level,
            user_agent,
            http_timeout,
            search_debounce,
            status_ttl: Duration::from_secs(status_ttl_secs),
        })
    }
}

fn parse_number(name: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse::<u64>().map_err(|_| {
        ConfigError::InvalidValue(name.to_string(), format!("'{}' is not a number", raw))
    })
}
