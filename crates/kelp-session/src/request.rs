//! Request building and dispatch

use crate::error::transport_error;
use crate::headers::{self, HeaderOverride};
use crate::response::Response;
use crate::session::Session;
use bytes::Bytes;
use http::header::{HeaderMap, ACCEPT_ENCODING, CONTENT_TYPE};
use http::HeaderValue;
use kelp_core::{Error, ProxyConfig, Result};
use reqwest::{Method, Url};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug)]
enum RequestBody {
    Bytes(Bytes),
    Json(Vec<u8>),
    Form(Vec<(String, String)>),
}

/// A request being prepared on a [`Session`]
#[derive(Debug)]
#[must_use = "a request does nothing until it is sent"]
pub struct RequestBuilder {
    session: Session,
    method: Method,
    url: String,
    headers: Vec<HeaderOverride>,
    query: Vec<(String, String)>,
    body: Option<RequestBody>,
    timeout: Option<Duration>,
    proxy: Option<ProxyConfig>,
    error: Option<Error>,
}

impl RequestBuilder {
    pub(crate) fn new(session: Session, method: Method, url: String) -> Self {
        Self {
            session,
            method,
            url,
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
            timeout: None,
            proxy: None,
            error: None,
        }
    }

    /// Set a header for this request. `None` removes it, including a session
    /// header of the same name.
    pub fn header<V: Into<String>>(mut self, name: impl Into<String>, value: Option<V>) -> Self {
        self.headers.push((name.into(), value.map(Into::into)));
        self
    }

    /// Set several headers, `None` values remove
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers.extend(
            headers
                .into_iter()
                .map(|(name, value)| (name.into(), value.map(Into::into))),
        );
        self
    }

    /// Append query parameters
    pub fn query<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query.extend(
            params
                .into_iter()
                .map(|(key, value)| (key.into(), value.into())),
        );
        self
    }

    /// JSON body
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(encoded) => self.body = Some(RequestBody::Json(encoded)),
            Err(e) => self.error = Some(e.into()),
        }
        self
    }

    /// URL-encoded form body
    pub fn form<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        self.body = Some(RequestBody::Form(fields));
        self
    }

    /// Raw body
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(RequestBody::Bytes(body.into()));
        self
    }

    /// Timeout for this request instead of the session default
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Proxy for this request instead of the session proxy
    pub fn proxy(mut self, proxy: impl Into<ProxyConfig>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Headers this request would send, before transport defaults and cookies
    pub fn effective_headers(&self) -> Result<HeaderMap> {
        let mut merged = headers::merge(&self.session.headers(), &self.headers)?;
        if !merged.contains_key(ACCEPT_ENCODING) {
            merged.insert(ACCEPT_ENCODING, self.session.accept_encoding().clone());
        }
        Ok(merged)
    }

    /// Send the request
    pub async fn send(mut self) -> Result<Response> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }

        let url = Url::parse(&self.url)
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", self.url)))?;
        let mut headers = self.effective_headers()?;

        let client = match &self.proxy {
            Some(proxy) => self.session.client_with_proxy(proxy)?,
            None => self.session.client()?,
        };
        let timeout = self.timeout.unwrap_or_else(|| self.session.timeout());

        let mut request = client.request(self.method.clone(), url);
        if !self.query.is_empty() {
            request = request.query(&self.query);
        }
        request = match self.body {
            Some(RequestBody::Bytes(bytes)) => request.body(bytes),
            Some(RequestBody::Json(encoded)) => {
                if !headers.contains_key(CONTENT_TYPE) {
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                }
                request.body(encoded)
            }
            Some(RequestBody::Form(fields)) => request.form(&fields),
            None => request,
        };

        debug!(
            method = %self.method,
            url = %self.url,
            timeout_ms = timeout.as_millis() as u64,
            "sending request"
        );

        let response = request
            .headers(headers)
            .timeout(timeout)
            .send()
            .await
            .map_err(transport_error)?;

        Response::from_transport(response, self.session.registry())
    }
}

/// Send a single request on a fresh default session.
///
/// The session and its client are dropped once the request is sent.
pub fn request(method: Method, url: impl Into<String>) -> RequestBuilder {
    Session::new().request(method, url)
}
