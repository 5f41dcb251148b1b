//! Configuration validation

use crate::{Config, SessionConfig};
use http::{HeaderName, HeaderValue};
use kelp_core::{Error, Result};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_session(&config.session)?;

    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(Error::Config(format!(
            "Invalid log level: {} (must be one of {})",
            config.logging.level,
            LOG_LEVELS.join(", ")
        )));
    }

    Ok(())
}

/// Validate session configuration
pub fn validate_session(session: &SessionConfig) -> Result<()> {
    if session.timeout.is_zero() {
        return Err(Error::Config("timeout must be > 0".to_string()));
    }

    if session.timeout.as_secs() > 300 {
        tracing::warn!("timeout is very high (>5 minutes)");
    }

    if session.connect_timeout.is_some_and(|t| t.is_zero()) {
        return Err(Error::Config("connect_timeout must be > 0".to_string()));
    }

    session
        .proxy
        .validate()
        .map_err(|e| Error::Config(e.to_string()))?;

    for (name, value) in &session.headers {
        HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::Config(format!("Invalid header name {name:?}: {e}")))?;
        HeaderValue::from_str(value)
            .map_err(|e| Error::Config(format!("Invalid value for header {name:?}: {e}")))?;
    }

    if let Some(user_agent) = &session.user_agent {
        HeaderValue::from_str(user_agent)
            .map_err(|e| Error::Config(format!("Invalid user_agent: {e}")))?;
    }

    if !session.verify {
        tracing::debug!("TLS certificate verification is disabled");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kelp_core::ProxyConfig;
    use std::time::Duration;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_timeout() {
        let mut config = Config::default();
        config.session.timeout = Duration::ZERO;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_invalid_proxy() {
        let mut config = Config::default();
        config.session.proxy = ProxyConfig::per_scheme([("https", "not a url")]);
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_invalid_header() {
        let mut config = Config::default();
        config
            .session
            .headers
            .insert("bad header".to_string(), "value".to_string());
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config
            .session
            .headers
            .insert("x-ok".to_string(), "line\nbreak".to_string());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(validate_config(&config).is_err());

        config.logging.level = "DEBUG".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
