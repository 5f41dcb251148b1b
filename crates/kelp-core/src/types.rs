//! Common types used throughout kelp

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Timeout applied to a request when the caller does not set one
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(45);

/// Proxy configuration for a session or a single request.
///
/// Accepts either one proxy URL for all traffic or a map from a target
/// pattern to a proxy URL. Map keys are `all`, a scheme (`http`, `https`),
/// either optionally followed by `://`, or a `<scheme>://<host>` pattern
/// where `<scheme>` may be `all` and `<host>` may start with `*`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProxyConfig {
    /// No proxy
    #[default]
    None,
    /// One proxy for every request
    Single(String),
    /// Proxy per scheme or host pattern
    PerScheme(BTreeMap<String, String>),
}

impl ProxyConfig {
    /// Build a single-proxy configuration
    pub fn single(url: impl Into<String>) -> Self {
        Self::Single(url.into())
    }

    /// Build a per-scheme configuration from `(pattern, url)` pairs
    pub fn per_scheme<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::PerScheme(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Whether no proxy is configured
    pub fn is_none(&self) -> bool {
        match self {
            Self::None => true,
            Self::Single(_) => false,
            Self::PerScheme(map) => map.is_empty(),
        }
    }

    /// Resolve into rules ordered from most to least specific
    pub fn rules(&self) -> Result<Vec<ProxyRule>> {
        let mut rules = match self {
            Self::None => Vec::new(),
            Self::Single(url) => vec![ProxyRule::new(ProxyTarget::All, url)?],
            Self::PerScheme(map) => map
                .iter()
                .map(|(pattern, url)| ProxyRule::new(ProxyTarget::parse(pattern)?, url))
                .collect::<Result<Vec<_>>>()?,
        };
        rules.sort_by_key(|rule| rule.target.rank());
        Ok(rules)
    }

    /// Validate every proxy URL and pattern
    pub fn validate(&self) -> Result<()> {
        self.rules().map(|_| ())
    }
}

impl From<&str> for ProxyConfig {
    fn from(url: &str) -> Self {
        Self::Single(url.to_string())
    }
}

impl From<String> for ProxyConfig {
    fn from(url: String) -> Self {
        Self::Single(url)
    }
}

impl From<BTreeMap<String, String>> for ProxyConfig {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self::PerScheme(map)
    }
}

/// Traffic a proxy rule applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyTarget {
    /// Every request
    All,
    /// Requests with this URL scheme
    Scheme(String),
    /// Requests to a host, optionally restricted to a scheme
    Host {
        /// Scheme restriction, `None` for any scheme
        scheme: Option<String>,
        /// Host name, a leading `*` matches any prefix
        host: String,
    },
}

impl ProxyTarget {
    /// Parse a per-scheme map key
    pub fn parse(pattern: &str) -> Result<Self> {
        let pattern = pattern.trim().to_ascii_lowercase();
        let (scheme, host) = match pattern.split_once("://") {
            Some((scheme, host)) => (scheme.to_string(), host.trim_end_matches('/')),
            None => (pattern.clone(), ""),
        };

        if scheme.is_empty() {
            return Err(Error::Proxy(format!("Invalid proxy pattern: {pattern:?}")));
        }

        match (scheme.as_str(), host) {
            ("all", "") => Ok(Self::All),
            (_, "") => Ok(Self::Scheme(scheme)),
            ("all", host) => Ok(Self::Host {
                scheme: None,
                host: host.to_string(),
            }),
            (_, host) => Ok(Self::Host {
                scheme: Some(scheme),
                host: host.to_string(),
            }),
        }
    }

    /// Whether a request URL falls under this target
    pub fn matches(&self, url: &Url) -> bool {
        match self {
            Self::All => true,
            Self::Scheme(scheme) => url.scheme() == scheme,
            Self::Host { scheme, host } => {
                if scheme.as_deref().is_some_and(|s| s != url.scheme()) {
                    return false;
                }
                let Some(url_host) = url.host_str() else {
                    return false;
                };
                match host.strip_prefix('*') {
                    Some(suffix) => url_host.ends_with(suffix),
                    None => url_host.eq_ignore_ascii_case(host),
                }
            }
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Host { .. } => 0,
            Self::Scheme(_) => 1,
            Self::All => 2,
        }
    }
}

/// A proxy URL bound to the traffic it applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRule {
    /// Traffic selector
    pub target: ProxyTarget,
    /// Proxy URL
    pub url: Url,
}

impl ProxyRule {
    fn new(target: ProxyTarget, url: &str) -> Result<Self> {
        let url = Url::parse(url)
            .map_err(|e| Error::Proxy(format!("Invalid proxy URL {url:?}: {e}")))?;
        Ok(Self { target, url })
    }
}
