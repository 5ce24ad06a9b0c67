//! Client configuration.
//!
//! Resolved once at process startup and handed to [`HttpApi`](crate::HttpApi); nothing in this
//! crate reads the environment while requests are in flight.

use std::time::Duration;

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("base URL cannot be empty")]
    EmptyBaseUrl,
    #[error("base URL must start with http:// or https://, got {0:?}")]
    InvalidBaseUrl(String),
    #[error("API token cannot be empty")]
    EmptyToken,
    #[error("invalid timeout {0:?}: expected a positive number of seconds")]
    InvalidTimeout(String),
}

/// Where the backend lives and how to authenticate against it.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    base_url: String,
    api_token: String,
    timeout: Duration,
}

impl ClientConfig {
    /// Create a new `ClientConfig`.
    ///
    /// A trailing slash on `base_url` is dropped so endpoint paths can be appended directly.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the base URL is blank or not HTTP(S), or the token is blank.
    pub fn new(
        base_url: impl Into<String>,
        api_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(base_url));
        }

        let api_token = api_token.into().trim().to_string();
        if api_token.is_empty() {
            return Err(ConfigError::EmptyToken);
        }

        Ok(Self {
            base_url,
            api_token,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_token(&self) -> &str {
        &self.api_token
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Parse a timeout in whole seconds from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_TIMEOUT`].
pub fn timeout_from_env_value(value: Option<String>) -> Result<Duration, ConfigError> {
    let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(DEFAULT_TIMEOUT);
    };
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout(value)),
    }
}
