//! Decoder plugin interface

use bytes::Bytes;
use kelp_core::DecodingError;
use std::fmt;

/// A stateful decoder for one content-encoded response body.
///
/// The pipeline calls [`decode`](ContentDecoder::decode) with each body chunk
/// in wire order, then [`flush`](ContentDecoder::flush) exactly once when the
/// body ends. A new instance is created for every response.
pub trait ContentDecoder: Send + fmt::Debug {
    /// Decode the next chunk of the body.
    ///
    /// Must not fail; problems with the data are reported by `flush`.
    /// An empty chunk returns empty output and leaves the state untouched.
    fn decode(&mut self, chunk: &[u8]) -> Bytes;

    /// Finish the body and return any remaining output.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodingError`] when the body ended in an invalid state:
    /// [`DecodingError::IncompleteFrame`] when it stopped inside a frame, and
    /// [`DecodingError::Corrupt`] when the decoder rejected the data. Callers
    /// that treat every decode failure alike should match
    /// `kelp_core::Error::Decoding(_)` or use `Error::is_decode()` rather
    /// than a single variant.
    fn flush(&mut self) -> Result<Bytes, DecodingError>;
}

impl<D: ContentDecoder + ?Sized> ContentDecoder for Box<D> {
    fn decode(&mut self, chunk: &[u8]) -> Bytes {
        (**self).decode(chunk)
    }

    fn flush(&mut self) -> Result<Bytes, DecodingError> {
        (**self).flush()
    }
}

/// Pass-through decoder for the `identity` coding
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityDecoder;

impl IdentityDecoder {
    /// Create a new identity decoder
    pub fn new() -> Self {
        Self
    }
}

impl ContentDecoder for IdentityDecoder {
    fn decode(&mut self, chunk: &[u8]) -> Bytes {
        Bytes::copy_from_slice(chunk)
    }

    fn flush(&mut self) -> Result<Bytes, DecodingError> {
        Ok(Bytes::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_passthrough() {
        let mut decoder = IdentityDecoder::new();
        assert_eq!(decoder.decode(b"hello"), Bytes::from_static(b"hello"));
        assert!(decoder.decode(b"").is_empty());
        assert!(decoder.flush().unwrap().is_empty());
    }

    #[test]
    fn test_boxed_decoder() {
        let mut decoder: Box<dyn ContentDecoder> = Box::new(IdentityDecoder);
        assert_eq!(decoder.decode(b"abc"), Bytes::from_static(b"abc"));
        assert!(decoder.flush().is_ok());
    }
}
