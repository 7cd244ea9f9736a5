//! Ride API client configuration.

use url::Url;
use zeroize::Zeroizing;

/// Default API location for local development.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration for connecting to the ride API.
///
/// Custom `Debug` redacts the token.
#[derive(Clone)]
pub struct RideClientConfig {
    /// Base URL of the ride API.
    pub api_url: Url,
    /// Bearer token, `{role}:{user_id}:{secret}`.
    pub api_token: Zeroizing<String>,
    /// Upper bound on every request, connection included.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for RideClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RideClientConfig")
            .field("api_url", &self.api_url)
            .field("api_token", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl RideClientConfig {
    /// Configuration for `api_url` with the default timeout.
    pub fn new(api_url: Url, api_token: impl Into<String>) -> Self {
        Self {
            api_url,
            api_token: Zeroizing::new(api_token.into()),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// - `RIDE_API_URL` (default `http://127.0.0.1:8080`)
    /// - `RIDE_API_TOKEN` (required)
    /// - `RIDE_TIMEOUT_SECS` (default 10)
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_token = std::env::var("RIDE_API_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;
        let timeout_secs = match std::env::var("RIDE_TIMEOUT_SECS") {
            Ok(raw) => parse_timeout(&raw)?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_url: env_url("RIDE_API_URL", DEFAULT_API_URL)?,
            api_token: Zeroizing::new(api_token),
            timeout_secs,
        })
    }
}

/// Parse a timeout in whole seconds; zero is rejected.
pub fn parse_timeout(raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidTimeout(raw.to_string())),
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("RIDE_API_TOKEN environment variable is required")]
    MissingToken,
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid timeout {0:?}: expected a positive number of seconds")]
    InvalidTimeout(String),
    #[error("token cannot be sent as an HTTP header")]
    InvalidToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_url_uses_default_when_var_absent() {
        let url = env_url("RIDE_NONEXISTENT_VAR_12345", "https://example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn env_url_rejects_invalid_url() {
        std::env::set_var("RIDE_TEST_BAD_URL", "not a url");
        let result = env_url("RIDE_TEST_BAD_URL", "https://example.com");
        std::env::remove_var("RIDE_TEST_BAD_URL");
        assert!(result.is_err());
    }

    #[test]
    fn timeout_must_be_positive() {
        assert_eq!(parse_timeout("15").unwrap(), 15);
        assert!(parse_timeout("0").is_err());
        assert!(parse_timeout("soon").is_err());
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = RideClientConfig::new(
            Url::parse(DEFAULT_API_URL).unwrap(),
            "rider:00000000-0000-0000-0000-000000000000:hunter2",
        );
        let debug = format!("{cfg:?}");
        assert!(!debug.contains("hunter2"));
        assert_eq!(cfg.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }
}
