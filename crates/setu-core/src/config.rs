//! Client configuration.
//!
//! Loads from environment variables with defaults that point at the Setu
//! sandbox. All settings can be overridden via `SETU_*` environment variables.

use std::time::Duration;

/// Base URL of the Setu digital-signature sandbox API.
pub const DEFAULT_BASE_URL: &str = "https://dg-sandbox.setu.co/api";

/// User agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("setu-esign/", env!("CARGO_PKG_VERSION"));

/// API client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to (no trailing slash).
    pub base_url: String,
    /// Whole-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SETU_BASE_URL` — API base URL (default: the sandbox)
    /// - `SETU_TIMEOUT_SECS` — request timeout in seconds; `0` or unset means none
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Unparseable values fall back to the default, as do blank ones.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let base_url = lookup("SETU_BASE_URL")
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.base_url);

        let timeout = lookup("SETU_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Self {
            base_url,
            timeout,
            user_agent: defaults.user_agent,
        }
        .normalized()
    }

    /// Override the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self.normalized()
    }

    fn normalized(mut self) -> Self {
        let trimmed = self.base_url.trim_end_matches('/').len();
        self.base_url.truncate(trimmed);
        self
    }
}
