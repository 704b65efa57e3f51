//! Core data types shared by the encoder, decoder and session.
//!
//! - [`PendingRequest`]: one queued sub-request, immutable once issued
//! - [`RequestBody`]: raw bytes or a structured JSON value
//! - [`BatchEnvelope`]: the encoded outer request
//! - [`DecodedPart`]: one sub-response unpacked from the batch response
//! - [`RequestTarget`]: how sub-request lines spell their target

use crate::protocol::HeaderList;
use bytes::Bytes;
use http::Method;
use serde::{Deserialize, Serialize};
use url::Url;

/// Body of a sub-request.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// Bytes written verbatim after the header block.
    Raw(Bytes),
    /// Structured value, serialized as JSON at encode time.
    Json(serde_json::Value),
}

impl RequestBody {
    /// Whether this body writes no bytes.
    pub fn is_empty(&self) -> bool {
        match self {
            RequestBody::Empty => true,
            RequestBody::Raw(bytes) => bytes.is_empty(),
            RequestBody::Json(_) => false,
        }
    }
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        RequestBody::Raw(bytes)
    }
}

impl From<&'static str> for RequestBody {
    fn from(text: &'static str) -> Self {
        RequestBody::Raw(Bytes::from_static(text.as_bytes()))
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Raw(Bytes::from(text))
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        RequestBody::Raw(Bytes::from(bytes))
    }
}

impl From<serde_json::Value> for RequestBody {
    fn from(value: serde_json::Value) -> Self {
        RequestBody::Json(value)
    }
}

/// A sub-request waiting to be sent as part of a batch.
///
/// The target is always an absolute URL on the batch endpoint's origin.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute target URL
    pub url: Url,
    /// Headers in the order they will be written
    pub headers: HeaderList,
    /// Request body
    pub body: RequestBody,
}

impl PendingRequest {
    /// Create a request with no headers and no body.
    pub fn new(method: Method, url: Url) -> Self {
        PendingRequest {
            method,
            url,
            headers: HeaderList::new(),
            body: RequestBody::Empty,
        }
    }

    /// Set the headers.
    pub fn with_headers(mut self, headers: HeaderList) -> Self {
        self.headers = headers;
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = body.into();
        self
    }

    /// Path plus query, as used in origin-form request lines.
    pub fn path_and_query(&self) -> String {
        match self.url.query() {
            Some(query) => format!("{}?{}", self.url.path(), query),
            None => self.url.path().to_string(),
        }
    }
}

/// How the target of each sub-request line is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestTarget {
    /// `PATCH http://host/person/alice HTTP/1.1`
    #[default]
    Absolute,
    /// `PATCH /person/alice HTTP/1.1`
    Origin,
}

/// The encoded outer request of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEnvelope {
    /// Top-level headers, including the multipart Content-Type.
    pub headers: HeaderList,
    /// Boundary token separating the parts.
    pub boundary: String,
    /// Boundary-delimited parts, without a top-level header block.
    pub body: Bytes,
}

/// One sub-response unpacked from a batch response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPart {
    /// Status code from the embedded status line
    pub status: u16,
    /// Reason phrase from the embedded status line
    pub reason: String,
    /// Headers of the embedded response
    pub headers: HeaderList,
    /// Body of the embedded response, without the framing CRLF
    pub body: Bytes,
    /// Trimmed `Content-ID` of the MIME part, if any
    pub content_id: Option<String>,
}

impl DecodedPart {
    /// Whether the embedded response has a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_is_empty() {
        assert!(RequestBody::Empty.is_empty());
        assert!(RequestBody::Raw(Bytes::new()).is_empty());
        assert!(!RequestBody::from("x").is_empty());
        assert!(!RequestBody::Json(serde_json::Value::Null).is_empty());
    }

    #[test]
    fn test_path_and_query() {
        let url = Url::parse("http://host/people/alice?fields=name").unwrap();
        let request = PendingRequest::new(Method::GET, url);
        assert_eq!(request.path_and_query(), "/people/alice?fields=name");
    }

    #[test]
    fn test_request_target_serde() {
        let target: RequestTarget = serde_json::from_str("\"origin\"").unwrap();
        assert_eq!(target, RequestTarget::Origin);
    }
}
