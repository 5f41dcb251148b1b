//! HTTP response with a decoded body

use crate::error::transport_error;
use bytes::Bytes;
use futures::TryStreamExt;
use http::header::CONTENT_LENGTH;
use http::{HeaderMap, StatusCode, Version};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, StreamBody};
use http_body::Frame;
use kelp_compression::{DecodedBody, DecoderRegistry};
use kelp_core::{Error, Result};
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Response body: the transport stream behind the selected decoder
pub type ResponseBody = DecodedBody<UnsyncBoxBody<Bytes, Error>>;

/// A response whose body is decoded as it is read.
///
/// Decoding failures surface from the read that reaches the end of the body.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    url: Url,
    body: ResponseBody,
}

impl Response {
    pub(crate) fn from_transport(
        response: reqwest::Response,
        registry: &DecoderRegistry,
    ) -> Result<Self> {
        let status = response.status();
        let version = response.version();
        let url = response.url().clone();
        let mut headers = response.headers().clone();

        let stream = response
            .bytes_stream()
            .map_ok(Frame::data)
            .map_err(transport_error);
        let body = registry.wrap(&mut headers, StreamBody::new(stream).boxed_unsync())?;

        debug!(
            status = %status,
            url = %url,
            decoding = body.is_decoding(),
            "received response"
        );

        Ok(Self {
            status,
            version,
            headers,
            url,
            body,
        })
    }

    /// Status code
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// HTTP version
    pub fn version(&self) -> Version {
        self.version
    }

    /// Response headers.
    ///
    /// `Content-Encoding` and `Content-Length` are removed when the body is
    /// decoded.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Final URL after redirects
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Length of the body as sent, when known and not decoded
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .get(CONTENT_LENGTH)?
            .to_str()
            .ok()?
            .parse()
            .ok()
    }

    /// Whether the body passes through a decoder
    pub fn is_decoded(&self) -> bool {
        self.body.is_decoding()
    }

    /// Turn a 4xx or 5xx status into [`Error::Status`]
    pub fn error_for_status(self) -> Result<Self> {
        self.check_status()?;
        Ok(self)
    }

    /// Borrowing variant of [`Response::error_for_status`]
    pub fn error_for_status_ref(&self) -> Result<&Self> {
        self.check_status()?;
        Ok(self)
    }

    fn check_status(&self) -> Result<()> {
        if self.status.is_client_error() || self.status.is_server_error() {
            return Err(Error::Status {
                status: self.status,
                url: self.url.to_string(),
            });
        }
        Ok(())
    }

    /// Next chunk of decoded body, `None` once the body is exhausted
    pub async fn chunk(&mut self) -> Result<Option<Bytes>> {
        while let Some(frame) = self.body.frame().await {
            if let Ok(data) = frame?.into_data() {
                return Ok(Some(data));
            }
        }
        Ok(None)
    }

    /// Read the whole decoded body
    pub async fn bytes(self) -> Result<Bytes> {
        Ok(self.body.collect().await?.to_bytes())
    }

    /// Read the whole decoded body as text, replacing invalid UTF-8
    pub async fn text(self) -> Result<String> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Deserialize the decoded body as JSON
    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        let bytes = self.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Decoded body
    pub fn into_body(self) -> ResponseBody {
        self.body
    }
}
