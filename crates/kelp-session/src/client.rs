//! Transport client construction

use crate::cookies::CookieJar;
use crate::proxy;
use kelp_config::SessionConfig;
use kelp_core::{Error, ProxyConfig, Result};
use reqwest::redirect::Policy;
use std::sync::Arc;
use tracing::debug;

/// Codings the transport decodes on its own
pub(crate) const BUILTIN_ENCODINGS: &[&str] = &["gzip", "deflate", "br"];

/// Build a transport client for a session configuration.
///
/// `proxy` overrides `config.proxy` so per-request proxies reuse the rest of
/// the session policy.
pub(crate) fn build(
    config: &SessionConfig,
    proxy: &ProxyConfig,
    cookies: Arc<CookieJar>,
) -> Result<reqwest::Client> {
    let redirect = if config.follow_redirects {
        Policy::limited(config.max_redirects)
    } else {
        Policy::none()
    };

    let mut builder = reqwest::Client::builder()
        .danger_accept_invalid_certs(!config.verify)
        .redirect(redirect)
        .cookie_provider(cookies);

    if let Some(connect_timeout) = config.connect_timeout {
        builder = builder.connect_timeout(connect_timeout);
    }

    if let Some(user_agent) = &config.user_agent {
        builder = builder.user_agent(user_agent.as_str());
    }

    let proxies = proxy::resolve(proxy)?;
    if proxies.is_empty() {
        builder = builder.no_proxy();
    } else {
        for rule in proxies {
            builder = builder.proxy(rule);
        }
    }

    debug!(
        verify = config.verify,
        proxied = !proxy.is_none(),
        "building HTTP client"
    );

    builder
        .build()
        .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))
}
