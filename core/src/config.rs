//! Client configuration.
//!
//! `base_url` is fixed for the client's lifetime; `auth_token` changes after
//! login. The config is an explicit value owned by whoever drives the
//! client, never a process-wide singleton.

use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Deadline for the root liveness probe. Never longer than the configured timeout.
pub const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    pub auth_token: Option<String>,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Read `API_URL`, `API_TOKEN` and `API_TIMEOUT_SECS` from the process
    /// environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injected variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("API_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = base_url.trim();
        if base_url.trim_end_matches('/').is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }

        let mut config = Self::new(base_url);

        if let Some(token) = lookup("API_TOKEN").filter(|t| !t.trim().is_empty()) {
            config.auth_token = Some(token.trim().to_string());
        }

        if let Some(raw) = lookup("API_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or(ConfigError::InvalidTimeout { value: raw.clone() })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}
