//! # Kelp Core
//!
//! Core types and error handling for the kelp HTTP session layer.
//!
//! This crate provides the foundational pieces shared by the other crates:
//! - Error taxonomy, including the body decoding errors
//! - Proxy configuration
//! - Session defaults

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod error;
pub mod types;

pub use error::{DecodingError, Error, Result};
pub use types::*;

// Re-export commonly used HTTP types
pub use http::{HeaderMap, Method, StatusCode};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{DecodingError, Error, Result};
    pub use crate::types::*;
}
