//! Batch request encoder.
//!
//! Serializes an ordered list of [`PendingRequest`]s into a single multipart MIME
//! body. Every part is typed `application/http` and carries the raw text of one
//! HTTP/1.1 request, unencoded. Part order equals request order, which is what the
//! session later relies on to pair responses with requests.
//!
//! # Body Layout
//!
//! ```text
//! --batch_5f0c...\r\n
//! Content-Type: application/http\r\n
//! MIME-Version: 1.0\r\n
//! \r\n
//! PATCH http://host/person/alice HTTP/1.1\r\n
//! ...\r\n
//! --batch_5f0c...--\r\n
//! ```
//!
//! The envelope's own `Content-Type` and `MIME-Version` are returned as headers
//! rather than written into the body.

use crate::error::{BatchError, Result};
use crate::protocol::constants::{headers, media_types, CRLF, MIME_VERSION_1_0};
use crate::protocol::headers::format_multipart_content_type;
use crate::protocol::message::write_request;
use crate::protocol::HeaderList;
use crate::types::{BatchEnvelope, PendingRequest, RequestTarget};
use bytes::{BufMut, BytesMut};
use uuid::Uuid;

/// Encoder turning pending requests into a [`BatchEnvelope`].
///
/// # Examples
///
/// ```
/// use http_batch::protocol::BatchEncoder;
/// use http_batch::types::PendingRequest;
/// use http::Method;
/// use url::Url;
///
/// let request = PendingRequest::new(Method::GET, Url::parse("http://host/a").unwrap());
/// let envelope = BatchEncoder::new()
///     .encode_with_boundary(&[request], "b1")
///     .unwrap();
///
/// assert_eq!(
///     envelope.headers.get("Content-Type"),
///     Some(r#"multipart/mixed; boundary="b1""#)
/// );
/// assert!(envelope.body.starts_with(b"--b1\r\nContent-Type: application/http\r\n"));
/// ```
#[derive(Debug, Clone)]
pub struct BatchEncoder {
    subtype: String,
    target: RequestTarget,
}

impl BatchEncoder {
    /// Encoder producing `multipart/mixed` with absolute request targets.
    pub fn new() -> Self {
        BatchEncoder {
            subtype: media_types::DEFAULT_MULTIPART_SUBTYPE.to_string(),
            target: RequestTarget::Absolute,
        }
    }

    /// Use `multipart/{subtype}` for the envelope.
    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = subtype.into();
        self
    }

    /// Choose how request lines spell their target.
    pub fn with_request_target(mut self, target: RequestTarget) -> Self {
        self.target = target;
        self
    }

    /// Fresh boundary token, unique per batch.
    pub fn generate_boundary() -> String {
        format!("batch_{}", Uuid::new_v4().simple())
    }

    /// Encode `requests` under a freshly generated boundary.
    ///
    /// # Errors
    ///
    /// - [`BatchError::EmptyBatch`] if `requests` is empty
    /// - [`BatchError::HeaderParse`] if a request carries an unwritable header
    /// - [`BatchError::Json`] if a JSON body fails to serialize
    pub fn encode(&self, requests: &[PendingRequest]) -> Result<BatchEnvelope> {
        self.encode_with_boundary(requests, &Self::generate_boundary())
    }

    /// Encode `requests` under the given boundary.
    ///
    /// Fails with [`BatchError::Usage`] if the delimiter occurs inside a payload.
    pub fn encode_with_boundary(
        &self,
        requests: &[PendingRequest],
        boundary: &str,
    ) -> Result<BatchEnvelope> {
        if requests.is_empty() {
            return Err(BatchError::EmptyBatch);
        }

        let delimiter = format!("--{}", boundary);
        let mut body = BytesMut::new();

        for request in requests {
            let payload = write_request(request, self.target)?;
            if payload
                .windows(delimiter.len())
                .any(|w| w == delimiter.as_bytes())
            {
                return Err(BatchError::Usage(format!(
                    "boundary '{}' occurs inside the {} {} payload",
                    boundary, request.method, request.url
                )));
            }

            body.put_slice(delimiter.as_bytes());
            body.put_slice(CRLF.as_bytes());
            body.put_slice(
                format!("{}: {}", headers::CONTENT_TYPE, media_types::APPLICATION_HTTP).as_bytes(),
            );
            body.put_slice(CRLF.as_bytes());
            body.put_slice(format!("{}: {}", headers::MIME_VERSION, MIME_VERSION_1_0).as_bytes());
            body.put_slice(CRLF.as_bytes());
            body.put_slice(CRLF.as_bytes());
            body.put_slice(&payload);
            body.put_slice(CRLF.as_bytes());
        }

        body.put_slice(delimiter.as_bytes());
        body.put_slice(b"--");
        body.put_slice(CRLF.as_bytes());

        let mut envelope_headers = HeaderList::new();
        envelope_headers.insert(
            headers::CONTENT_TYPE,
            format_multipart_content_type(&self.subtype, boundary),
        );
        envelope_headers.insert(headers::MIME_VERSION, MIME_VERSION_1_0);

        tracing::debug!(
            "encoded {} requests into {} byte batch body",
            requests.len(),
            body.len()
        );

        Ok(BatchEnvelope {
            headers: envelope_headers,
            boundary: boundary.to_string(),
            body: body.freeze(),
        })
    }
}

impl Default for BatchEncoder {
    fn default() -> Self {
        Self::new()
    }
}
