//! Persistent HTTP session

use crate::client::{self, BUILTIN_ENCODINGS};
use crate::cookies::CookieJar;
use crate::headers;
use crate::request::RequestBuilder;
use http::header::{HeaderMap, HeaderValue};
use kelp_compression::DecoderRegistry;
use kelp_config::{validate_session, SessionConfig};
use kelp_core::{Error, ProxyConfig, Result};
use parking_lot::{Mutex, RwLock};
use reqwest::Method;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

enum ClientState {
    Unopened,
    Open(reqwest::Client),
    Closed,
}

struct Inner {
    config: RwLock<SessionConfig>,
    headers: RwLock<HeaderMap>,
    cookies: Arc<CookieJar>,
    registry: Arc<DecoderRegistry>,
    accept_encoding: HeaderValue,
    client: Mutex<ClientState>,
}

/// A persistent HTTP session.
///
/// The transport client is created by the first request and reused until
/// [`Session::close`]. Cloning is cheap and clones share headers, cookies and
/// the client. The client is released when the last clone is dropped.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl Session {
    /// Session with default settings: no TLS verification, no proxy, 45s
    /// timeout, zstd decoding
    pub fn new() -> Self {
        Self::from_parts(
            SessionConfig::default(),
            HeaderMap::new(),
            Arc::new(CookieJar::new()),
            Arc::new(DecoderRegistry::default()),
        )
    }

    /// Session from a configuration
    pub fn with_config(config: SessionConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Start building a session
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    fn from_parts(
        config: SessionConfig,
        headers: HeaderMap,
        cookies: Arc<CookieJar>,
        registry: Arc<DecoderRegistry>,
    ) -> Self {
        let accept_encoding = HeaderValue::from_str(&registry.accept_encoding(BUILTIN_ENCODINGS))
            .unwrap_or_else(|_| HeaderValue::from_static("gzip, deflate, br"));

        Self {
            inner: Arc::new(Inner {
                config: RwLock::new(config),
                headers: RwLock::new(headers),
                cookies,
                registry,
                accept_encoding,
                client: Mutex::new(ClientState::Unopened),
            }),
        }
    }

    /// Snapshot of the session headers
    pub fn headers(&self) -> HeaderMap {
        self.inner.headers.read().clone()
    }

    /// Set a session header, replacing any previous value
    pub fn set_header(&self, name: &str, value: &str) -> Result<()> {
        let key = headers::header_name(name)?;
        let value = headers::header_value(name, value)?;
        self.inner.headers.write().insert(key, value);
        Ok(())
    }

    /// Remove a session header
    pub fn remove_header(&self, name: &str) -> Result<Option<HeaderValue>> {
        let key = headers::header_name(name)?;
        Ok(self.inner.headers.write().remove(key))
    }

    /// Whether TLS certificates are verified
    pub fn verify(&self) -> bool {
        self.inner.config.read().verify
    }

    /// Enable or disable TLS verification for subsequent requests
    pub fn set_verify(&self, verify: bool) {
        self.inner.config.write().verify = verify;
        self.reset_client();
    }

    /// Session proxy
    pub fn proxy(&self) -> ProxyConfig {
        self.inner.config.read().proxy.clone()
    }

    /// Replace the session proxy.
    ///
    /// Requests already in flight finish on the previous client.
    pub fn set_proxy(&self, proxy: impl Into<ProxyConfig>) -> Result<()> {
        let proxy = proxy.into();
        proxy.validate()?;

        info!(proxied = !proxy.is_none(), "session proxy changed");
        self.inner.config.write().proxy = proxy;
        self.reset_client();
        Ok(())
    }

    /// Default per-request timeout
    pub fn timeout(&self) -> Duration {
        self.inner.config.read().timeout
    }

    /// Change the default per-request timeout
    pub fn set_timeout(&self, timeout: Duration) -> Result<()> {
        if timeout.is_zero() {
            return Err(Error::Config("timeout must be > 0".to_string()));
        }
        self.inner.config.write().timeout = timeout;
        Ok(())
    }

    /// Session cookie jar
    pub fn cookies(&self) -> &CookieJar {
        &self.inner.cookies
    }

    /// Shared handle to the cookie jar
    pub fn cookie_jar(&self) -> Arc<CookieJar> {
        Arc::clone(&self.inner.cookies)
    }

    /// Snapshot of the cookies as a name/value map
    pub fn cookie_map(&self) -> BTreeMap<String, String> {
        self.inner.cookies.to_map()
    }

    /// Decoder registry used for responses
    pub fn registry(&self) -> &DecoderRegistry {
        &self.inner.registry
    }

    /// `Accept-Encoding` value sent unless a request overrides it
    pub fn accept_encoding(&self) -> &HeaderValue {
        &self.inner.accept_encoding
    }

    /// Whether a transport client is currently open
    pub fn is_open(&self) -> bool {
        matches!(*self.inner.client.lock(), ClientState::Open(_))
    }

    /// Whether the session has been closed
    pub fn is_closed(&self) -> bool {
        matches!(*self.inner.client.lock(), ClientState::Closed)
    }

    /// Close the session.
    ///
    /// Returns `true` on the first call. Later requests fail with
    /// [`Error::SessionClosed`].
    pub fn close(&self) -> bool {
        let previous = std::mem::replace(&mut *self.inner.client.lock(), ClientState::Closed);
        match previous {
            ClientState::Closed => false,
            ClientState::Open(_) => {
                debug!("session client closed");
                true
            }
            ClientState::Unopened => true,
        }
    }

    /// Start a request
    pub fn request(&self, method: Method, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(self.clone(), method, url.into())
    }

    /// Start a GET request
    pub fn get(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    /// Start a POST request
    pub fn post(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    /// Start a PUT request
    pub fn put(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::PUT, url)
    }

    /// Start a PATCH request
    pub fn patch(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::PATCH, url)
    }

    /// Start a DELETE request
    pub fn delete(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::DELETE, url)
    }

    /// Start a HEAD request
    pub fn head(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::HEAD, url)
    }

    /// The session client, opened on first use
    pub(crate) fn client(&self) -> Result<reqwest::Client> {
        let mut state = self.inner.client.lock();
        match &*state {
            ClientState::Open(client) => Ok(client.clone()),
            ClientState::Closed => Err(Error::SessionClosed),
            ClientState::Unopened => {
                let client = {
                    let config = self.inner.config.read();
                    client::build(&config, &config.proxy, self.cookie_jar())?
                };
                info!("session client opened");
                *state = ClientState::Open(client.clone());
                Ok(client)
            }
        }
    }

    /// A one-off client with a different proxy, sharing the cookie jar
    pub(crate) fn client_with_proxy(&self, proxy: &ProxyConfig) -> Result<reqwest::Client> {
        if self.is_closed() {
            return Err(Error::SessionClosed);
        }
        let config = self.inner.config.read();
        client::build(&config, proxy, self.cookie_jar())
    }

    fn reset_client(&self) {
        let mut state = self.inner.client.lock();
        if matches!(*state, ClientState::Open(_)) {
            debug!("session client reset");
            *state = ClientState::Unopened;
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match *self.inner.client.lock() {
            ClientState::Unopened => "unopened",
            ClientState::Open(_) => "open",
            ClientState::Closed => "closed",
        };
        f.debug_struct("Session")
            .field("config", &*self.inner.config.read())
            .field("headers", &*self.inner.headers.read())
            .field("cookies", &self.inner.cookies.len())
            .field("client", &state)
            .finish()
    }
}

/// Builder for [`Session`]
#[derive(Debug, Default)]
pub struct SessionBuilder {
    config: SessionConfig,
    registry: Option<DecoderRegistry>,
    cookies: Option<Arc<CookieJar>>,
}

impl SessionBuilder {
    /// Replace the whole configuration
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Verify TLS certificates
    pub fn verify(mut self, verify: bool) -> Self {
        self.config.verify = verify;
        self
    }

    /// Proxy for every request
    pub fn proxy(mut self, proxy: impl Into<ProxyConfig>) -> Self {
        self.config.proxy = proxy.into();
        self
    }

    /// Default per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    /// Follow redirects
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.config.follow_redirects = follow;
        self
    }

    /// Session header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.insert(name.into(), value.into());
        self
    }

    /// User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Decoder registry for responses
    pub fn registry(mut self, registry: DecoderRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Share an existing cookie jar
    pub fn cookie_jar(mut self, cookies: Arc<CookieJar>) -> Self {
        self.cookies = Some(cookies);
        self
    }

    /// Validate the configuration and build the session
    pub fn build(self) -> Result<Session> {
        validate_session(&self.config)?;
        let headers = headers::from_pairs(&self.config.headers)?;

        Ok(Session::from_parts(
            self.config,
            headers,
            self.cookies.unwrap_or_default(),
            Arc::new(self.registry.unwrap_or_default()),
        ))
    }
}
