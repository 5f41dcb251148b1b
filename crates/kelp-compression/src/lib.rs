//! Response body decoding for kelp
//!
//! Provides the content-decoding pipeline used by the session layer:
//! - [`ContentDecoder`], the decode/flush contract every decoder implements
//! - [`ZstdDecoder`], a streaming zstd decoder that follows concatenated frames
//! - [`DecoderRegistry`], the Content-Encoding token to decoder factory table
//! - [`DecodedBody`], an `http_body::Body` adapter that runs a decoder over a body
//!
//! The transport keeps its built-in codings (gzip, deflate, br); the registry
//! adds the ones it does not know about.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod body;
pub mod decoder;
pub mod registry;
pub mod zstd_decoder;

pub use body::DecodedBody;
pub use decoder::{ContentDecoder, IdentityDecoder};
pub use registry::{DecoderFactory, DecoderRegistry};
pub use zstd_decoder::ZstdDecoder;
