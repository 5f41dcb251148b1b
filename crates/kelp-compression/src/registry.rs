//! Content-Encoding token to decoder factory table

use crate::body::DecodedBody;
use crate::decoder::{ContentDecoder, IdentityDecoder};
use crate::zstd_decoder::{self, ZstdDecoder};
use http::header::{CONTENT_ENCODING, CONTENT_LENGTH};
use http::HeaderMap;
use kelp_core::DecodingError;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Factory producing a fresh decoder for one response body
pub type DecoderFactory =
    Arc<dyn Fn() -> Result<Box<dyn ContentDecoder>, DecodingError> + Send + Sync>;

/// Table of decoders keyed by Content-Encoding token.
///
/// Built once and handed to the session; read-only afterwards.
#[derive(Clone)]
pub struct DecoderRegistry {
    factories: BTreeMap<String, DecoderFactory>,
}

impl DecoderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Register a decoder factory under `token`, returning the one it replaces
    pub fn register<F>(&mut self, token: impl AsRef<str>, factory: F) -> Option<DecoderFactory>
    where
        F: Fn() -> Result<Box<dyn ContentDecoder>, DecodingError> + Send + Sync + 'static,
    {
        let token = normalize(token.as_ref());
        debug!(token = %token, "registering content decoder");
        self.factories.insert(token, Arc::new(factory))
    }

    /// Builder-style [`register`](Self::register)
    pub fn with<F>(mut self, token: impl AsRef<str>, factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn ContentDecoder>, DecodingError> + Send + Sync + 'static,
    {
        self.register(token, factory);
        self
    }

    /// Remove the factory registered under `token`
    pub fn unregister(&mut self, token: &str) -> Option<DecoderFactory> {
        self.factories.remove(&normalize(token))
    }

    /// Whether a decoder is registered for `token`
    pub fn contains(&self, token: &str) -> bool {
        self.factories.contains_key(&normalize(token))
    }

    /// Registered tokens in sorted order
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Create a decoder for a Content-Encoding header value.
    ///
    /// Returns `None` when the value is not a single registered token;
    /// stacked codings such as `gzip, zstd` are left to the transport.
    pub fn decoder_for(
        &self,
        content_encoding: &str,
    ) -> Option<Result<Box<dyn ContentDecoder>, DecodingError>> {
        let token = normalize(content_encoding);
        if token.contains(',') {
            return None;
        }
        self.factories.get(&token).map(|factory| factory())
    }

    /// Value for the `Accept-Encoding` request header: the transport's
    /// built-in codings followed by every registered token except `identity`
    pub fn accept_encoding(&self, builtin: &[&str]) -> String {
        let mut tokens: Vec<&str> = builtin.to_vec();
        for token in self.tokens() {
            if token != "identity" && !tokens.contains(&token) {
                tokens.push(token);
            }
        }
        tokens.join(", ")
    }

    /// Wrap a response body with the decoder its headers ask for.
    ///
    /// When a decoder is selected, `Content-Encoding` and `Content-Length` are
    /// removed from `headers` because they describe the encoded body.
    pub fn wrap<B>(&self, headers: &mut HeaderMap, body: B) -> Result<DecodedBody<B>, DecodingError> {
        let mut values = headers.get_all(CONTENT_ENCODING).iter();
        let encoding = match (values.next(), values.next()) {
            (Some(value), None) => value.to_str().ok(),
            _ => None,
        };

        let Some(encoding) = encoding else {
            return Ok(DecodedBody::passthrough(body));
        };

        match self.decoder_for(encoding) {
            Some(decoder) => {
                let decoder = decoder?;
                debug!(encoding, "decoding response body");
                headers.remove(CONTENT_ENCODING);
                headers.remove(CONTENT_LENGTH);
                Ok(DecodedBody::new(body, decoder))
            }
            None => Ok(DecodedBody::passthrough(body)),
        }
    }
}

impl Default for DecoderRegistry {
    /// Registry with `identity` and `zstd`
    fn default() -> Self {
        Self::new()
            .with("identity", || {
                Ok(Box::new(IdentityDecoder::new()) as Box<dyn ContentDecoder>)
            })
            .with(zstd_decoder::ENCODING, || {
                Ok(Box::new(ZstdDecoder::new()?) as Box<dyn ContentDecoder>)
            })
    }
}

impl fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderRegistry")
            .field("tokens", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn normalize(token: &str) -> String {
    token.trim().to_ascii_lowercase()
}
