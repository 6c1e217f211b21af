// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Client configuration.
//!
//! [`ClientConfig`] is passed to [`StruAiClient::new`](crate::client::StruAiClient::new)
//! and is the only place defaults live. There is no process-wide mutable state:
//! environment variables are read once, explicitly, by [`ClientConfig::from_env`].

use std::time::Duration;

use url::Url;

use crate::error::{Result, StruAiError};

/// Production API endpoint, including the version prefix.
pub const DEFAULT_BASE_URL: &str = "https://api.stru.ai/v1";

/// Per-request timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "STRUAI_API_KEY";

/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "STRUAI_BASE_URL";

/// Environment variable overriding the request timeout, in whole seconds.
pub const TIMEOUT_ENV: &str = "STRUAI_TIMEOUT_SECS";

/// Connection settings for a [`StruAiClient`](crate::client::StruAiClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Bearer token sent with every request.
    pub api_key: String,
    /// API root. A bare host gets `/v1` appended during normalisation.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl ClientConfig {
    /// Configuration with the given API key and default endpoint settings.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("struai-rust/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Override the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a configuration from `STRUAI_API_KEY`, `STRUAI_BASE_URL` and
    /// `STRUAI_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns [`StruAiError::Config`] if the API key is missing or the timeout
    /// is not a whole number of seconds.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_ENV)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                StruAiError::Config(format!(
                    "API key required. Pass one explicitly or set {API_KEY_ENV}"
                ))
            })?;

        let mut config = Self::new(api_key);

        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            config.base_url = base_url;
        }

        if let Some(raw) = lookup(TIMEOUT_ENV).filter(|v| !v.trim().is_empty()) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                StruAiError::Config(format!("{TIMEOUT_ENV} must be whole seconds, got {raw:?}"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Parse and normalise [`base_url`](Self::base_url).
    ///
    /// Trailing slashes are dropped and a URL without a path gets `/v1`.
    pub(crate) fn resolved_base_url(&self) -> Result<Url> {
        let mut url = Url::parse(self.base_url.trim())
            .map_err(|e| StruAiError::Config(format!("Invalid base URL: {e}")))?;

        if url.cannot_be_a_base() {
            return Err(StruAiError::Config(format!(
                "Base URL cannot carry paths: {}",
                self.base_url
            )));
        }

        let path = url.path().trim_end_matches('/').to_string();
        if path.is_empty() {
            url.set_path("/v1");
        } else {
            url.set_path(&path);
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn bare_host_gets_version_prefix() {
        let config = ClientConfig::new("k").with_base_url("https://api.stru.ai");
        assert_eq!(
            config.resolved_base_url().unwrap().as_str(),
            "https://api.stru.ai/v1"
        );
    }

    #[test]
    fn explicit_path_is_kept_without_trailing_slash() {
        let config = ClientConfig::new("k").with_base_url("http://localhost:8000/v2/");
        assert_eq!(
            config.resolved_base_url().unwrap().as_str(),
            "http://localhost:8000/v2"
        );
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let config = ClientConfig::new("k").with_base_url("not a url");
        assert!(matches!(
            config.resolved_base_url(),
            Err(StruAiError::Config(_))
        ));
    }

    #[test]
    fn lookup_requires_api_key() {
        let err = ClientConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains(API_KEY_ENV));
    }

    #[test]
    fn lookup_reads_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            (API_KEY_ENV, "sk-test"),
            (BASE_URL_ENV, "http://localhost:8000"),
            (TIMEOUT_ENV, "5"),
        ]))
        .unwrap();
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn lookup_rejects_fractional_timeout() {
        let err = ClientConfig::from_lookup(lookup_from(&[
            (API_KEY_ENV, "sk-test"),
            (TIMEOUT_ENV, "1.5"),
        ]))
        .unwrap_err();
        assert!(matches!(err, StruAiError::Config(_)));
    }

    #[test]
    fn defaults() {
        let config = ClientConfig::new("sk-test");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(config.user_agent.starts_with("struai-rust/"));
    }
}
