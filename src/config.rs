//! Client configuration parsed from environment variables.

use std::path::PathBuf;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_SESSION_DIR: &str = ".coinfolio";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SPLASH_DELAY_MS: u64 = 0;

/// Errors produced while building a [`ClientConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    ConfigParse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root including the `/api` prefix, without a trailing slash.
    pub base_url: String,
    /// Directory holding the persisted session entries.
    pub session_dir: PathBuf,
    pub timeouts: Timeouts,
    /// How long the route guard holds the interstitial before checking status.
    pub splash_delay_ms: u64,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `COINFOLIO_API_BASE_URL`: default `http://localhost:8000/api`
    /// - `COINFOLIO_SESSION_DIR`: default `.coinfolio`
    /// - `COINFOLIO_REQUEST_TIMEOUT_SECS`: default 30
    /// - `COINFOLIO_CONNECT_TIMEOUT_SECS`: default 10
    /// - `COINFOLIO_SPLASH_DELAY_MS`: default 0
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not an http(s) URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = parse_base_url(
            std::env::var("COINFOLIO_API_BASE_URL")
                .ok()
                .as_deref()
                .unwrap_or(DEFAULT_API_BASE_URL),
        )?;
        let session_dir = std::env::var("COINFOLIO_SESSION_DIR")
            .map_or_else(|_| PathBuf::from(DEFAULT_SESSION_DIR), PathBuf::from);
        let timeouts = Timeouts {
            request_secs: env_parse("COINFOLIO_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse("COINFOLIO_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let splash_delay_ms = env_parse("COINFOLIO_SPLASH_DELAY_MS", DEFAULT_SPLASH_DELAY_MS);

        Ok(Self { base_url, session_dir, timeouts, splash_delay_ms })
    }

    /// Replace the base URL, applying the same validation as [`Self::from_env`].
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` is not an http(s) URL.
    pub fn with_base_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.base_url = parse_base_url(raw)?;
        Ok(self)
    }

    /// Whether cookies mirrored for this backend should carry `Secure`.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

pub(crate) fn parse_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::ConfigParse(format!("base URL must be http(s): {raw}")));
    }
    reqwest::Url::parse(trimmed).map_err(|e| ConfigError::ConfigParse(format!("invalid base URL {raw}: {e}")))?;
    Ok(trimmed.to_owned())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
