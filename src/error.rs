//! Error types for batch encoding, decoding and dispatch.
//!
//! Every fallible operation in the crate returns [`Result`], whose error type is
//! [`BatchError`]. Nothing in the crate retries: an error always propagates to the
//! caller of the operation that detected it.
//!
//! | Variant | Raised by |
//! |---------|-----------|
//! | `EmptyBatch` | `BatchEncoder::encode`, `BatchSession::finalize` |
//! | `Http` / `HttpStatus` | the outbound envelope call |
//! | `MalformedResponse` | `BatchDecoder::decode`, result pairing |
//! | `Usage` | reading a [`Deferred`](crate::client::Deferred) too early |

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BatchError>;

/// Errors produced while building, sending or unpacking a batch.
#[derive(Debug, Error)]
pub enum BatchError {
    /// A batch was finalized or encoded with no queued requests.
    #[error("no deferred requests to send")]
    EmptyBatch,

    /// The envelope request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The envelope request itself returned a failing status code.
    #[error("batch request failed with status {status}")]
    HttpStatus {
        /// Status code of the envelope response.
        status: u16,
        /// Response body, lossily decoded, for diagnostics.
        body: String,
    },

    /// The server's batch response violated the multipart/http framing.
    #[error("malformed batch response: {0}")]
    MalformedResponse(String),

    /// The API was used out of order, e.g. reading a result before finalize.
    #[error("usage error: {0}")]
    Usage(String),

    /// The batch endpoint or a request target could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization of a request body or decoding of a result failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A caller-supplied header cannot be written on the wire.
    #[error("header error: {0}")]
    HeaderParse(String),
}

impl BatchError {
    /// Returns `true` if the server broke the batch protocol contract.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::MalformedResponse(_))
    }

    /// Returns `true` if the error stems from calling the API in the wrong order.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::Usage(_) | Self::EmptyBatch)
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }
}

impl From<reqwest::Error> for BatchError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(BatchError::malformed("no boundary").is_protocol_violation());
        assert!(BatchError::Usage("early".into()).is_usage_error());
        assert!(BatchError::EmptyBatch.is_usage_error());
        assert!(!BatchError::Http("refused".into()).is_protocol_violation());
    }

    #[test]
    fn test_error_display() {
        let err = BatchError::HttpStatus {
            status: 502,
            body: String::new(),
        };
        assert_eq!(err.to_string(), "batch request failed with status 502");
        assert_eq!(
            BatchError::malformed("missing boundary").to_string(),
            "malformed batch response: missing boundary"
        );
    }
}
