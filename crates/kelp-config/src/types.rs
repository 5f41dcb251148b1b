//! Configuration types

use kelp_core::{ProxyConfig, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Session configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP session configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// Verify TLS certificates (off unless enabled)
    #[serde(default)]
    pub verify: bool,

    /// Proxy for every request of the session
    #[serde(default)]
    pub proxy: ProxyConfig,

    /// Per-request timeout, used when a request does not set its own
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Connect timeout
    #[serde(default, with = "humantime_serde")]
    pub connect_timeout: Option<Duration>,

    /// Follow redirects
    #[serde(default = "default_follow_redirects")]
    pub follow_redirects: bool,

    /// Maximum redirects followed per request
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// User-Agent header
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            verify: false,
            proxy: ProxyConfig::None,
            timeout: default_timeout(),
            connect_timeout: None,
            follow_redirects: default_follow_redirects(),
            max_redirects: default_max_redirects(),
            headers: BTreeMap::new(),
            user_agent: None,
        }
    }
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_follow_redirects() -> bool {
    true
}

fn default_max_redirects() -> usize {
    20
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of text
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_defaults() {
        let config = SessionConfig::default();
        assert!(!config.verify);
        assert!(config.proxy.is_none());
        assert_eq!(config.timeout, Duration::from_secs(45));
        assert!(config.follow_redirects);
        assert_eq!(config.max_redirects, 20);
        assert!(config.headers.is_empty());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.logging.level, "info");
    }
}
