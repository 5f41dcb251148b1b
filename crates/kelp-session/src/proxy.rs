//! Proxy rules for the transport client

use kelp_core::{Error, ProxyConfig, ProxyRule, ProxyTarget, Result};
use reqwest::Proxy;

/// Resolve a proxy configuration into transport proxies, most specific first.
///
/// An empty result means requests go out directly.
pub fn resolve(config: &ProxyConfig) -> Result<Vec<Proxy>> {
    config.rules()?.into_iter().map(to_proxy).collect()
}

fn to_proxy(rule: ProxyRule) -> Result<Proxy> {
    let ProxyRule { target, url } = rule;

    let proxy = match target {
        ProxyTarget::All => Proxy::all(url.as_str()),
        ProxyTarget::Scheme(ref scheme) if scheme == "http" => Proxy::http(url.as_str()),
        ProxyTarget::Scheme(ref scheme) if scheme == "https" => Proxy::https(url.as_str()),
        target => Ok(Proxy::custom(move |request_url| {
            target.matches(request_url).then(|| url.clone())
        })),
    };

    proxy.map_err(|e| Error::Proxy(e.to_string()))
}
