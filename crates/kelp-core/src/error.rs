//! Error types for kelp

use http::StatusCode;

/// Result type alias using [`Error`]
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure to decode a content-encoded response body.
///
/// Raised when the body is finalized, never while it is still streaming.
#[derive(Debug, thiserror::Error)]
pub enum DecodingError {
    /// The body ended before the active frame reached its end marker
    #[error("{encoding} data is incomplete")]
    IncompleteFrame {
        /// Content-Encoding token of the decoder
        encoding: &'static str,
    },

    /// The decoder rejected the compressed data
    #[error("{encoding} data is corrupt: {reason}")]
    Corrupt {
        /// Content-Encoding token of the decoder
        encoding: &'static str,
        /// Message reported by the decompression engine
        reason: String,
    },

    /// The decompression context could not be created
    #[error("failed to initialize {encoding} decoder: {source}")]
    Init {
        /// Content-Encoding token of the decoder
        encoding: &'static str,
        /// Underlying engine error
        #[source]
        source: std::io::Error,
    },
}

impl DecodingError {
    /// Content-Encoding token of the decoder that failed
    pub fn encoding(&self) -> &'static str {
        match self {
            Self::IncompleteFrame { encoding }
            | Self::Corrupt { encoding, .. }
            | Self::Init { encoding, .. } => encoding,
        }
    }
}

/// Main error type for kelp
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Response body could not be decoded
    #[error("Decoding error: {0}")]
    Decoding(#[from] DecodingError),

    /// Connection to the remote host or proxy failed
    #[error("Failed to connect: {0}")]
    Connect(String),

    /// Request timed out
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Redirect policy violated (loop or too many redirects)
    #[error("Redirect error: {0}")]
    Redirect(String),

    /// Server answered with a client or server error status
    #[error("HTTP status {status} for url {url}")]
    Status {
        /// Response status
        status: StatusCode,
        /// Final request URL
        url: String,
    },

    /// Any other transport failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Reading the response body failed
    #[error("Failed to read body: {0}")]
    Body(String),

    /// Request URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Header name or value is not valid HTTP
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Proxy configuration could not be applied
    #[error("Proxy error: {0}")]
    Proxy(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session was closed before the request was sent
    #[error("Session is closed")]
    SessionClosed,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (should not happen in production)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the response body failed to decode
    pub fn is_decode(&self) -> bool {
        matches!(self, Error::Decoding(_))
    }

    /// Whether the request timed out
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }

    /// Whether the connection could not be established
    pub fn is_connect(&self) -> bool {
        matches!(self, Error::Connect(_) | Error::Proxy(_))
    }

    /// Whether the server returned an error status
    pub fn is_status(&self) -> bool {
        matches!(self, Error::Status { .. })
    }

    /// Status code carried by the error, if any
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoding_error_message() {
        let err = DecodingError::IncompleteFrame { encoding: "zstd" };
        assert_eq!(err.to_string(), "zstd data is incomplete");
        assert_eq!(err.encoding(), "zstd");
    }

    #[test]
    fn test_decoding_error_converts() {
        let err: Error = DecodingError::Corrupt {
            encoding: "zstd",
            reason: "Unknown frame descriptor".to_string(),
        }
        .into();
        assert!(err.is_decode());
        assert!(!err.is_timeout());
        assert!(err.to_string().contains("Unknown frame descriptor"));
    }

    #[test]
    fn test_every_decoding_failure_is_decode() {
        let failures = [
            DecodingError::IncompleteFrame { encoding: "zstd" },
            DecodingError::Corrupt {
                encoding: "zstd",
                reason: "Restored data doesn't match checksum".to_string(),
            },
        ];

        for failure in failures {
            let err = Error::from(failure);
            assert!(err.is_decode());
            assert!(matches!(err, Error::Decoding(_)));
        }
    }

    #[test]
    fn test_status_error() {
        let err = Error::Status {
            status: StatusCode::NOT_FOUND,
            url: "http://localhost/missing".to_string(),
        };
        assert!(err.is_status());
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_connect_predicates() {
        assert!(Error::Connect("refused".to_string()).is_connect());
        assert!(Error::Proxy("bad scheme".to_string()).is_connect());
        assert!(!Error::SessionClosed.is_connect());
    }
}
