//! # Kelp Session
//!
//! Persistent, cookie-aware asynchronous HTTP session:
//! - Lazily opened transport client, closed once
//! - Session headers merged with per-request overrides
//! - Proxy and TLS verification policy
//! - Transparent zstd (and any registered coding) response decoding
//!
//! ```no_run
//! # async fn run() -> kelp_session::Result<()> {
//! let session = kelp_session::Session::new();
//! session.set_header("x-client", "kelp")?;
//!
//! let response = session.get("https://example.com/data").send().await?;
//! let text = response.error_for_status()?.text().await?;
//! # let _ = text;
//! session.close();
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod cookies;
pub mod headers;
pub mod proxy;
pub mod request;
pub mod response;
pub mod session;

mod client;
mod error;

pub use cookies::CookieJar;
pub use request::{request, RequestBuilder};
pub use response::{Response, ResponseBody};
pub use session::{Session, SessionBuilder};

pub use kelp_compression::{ContentDecoder, DecoderRegistry, ZstdDecoder};
pub use kelp_config::SessionConfig;
pub use kelp_core::{DecodingError, Error, ProxyConfig, Result, DEFAULT_TIMEOUT};
pub use reqwest::Method;
