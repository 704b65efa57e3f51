//! Batch session: queue requests, send them as one envelope, resolve results.
//!
//! # Lifecycle
//!
//! ```text
//! Open ──finalize(self)──▶ Finalizing ──▶ Closed
//! ```
//!
//! While open, [`BatchSession::issue`] and its shorthands only append to two
//! parallel lists (requests and their [`Deferred`] handles) and return at once.
//! [`BatchSession::finalize`] consumes the session, so a batch can be sent at most
//! once. It encodes the requests, POSTs the envelope through the
//! [`BatchTransport`], decodes the reply and resolves the handles in issue order.
//!
//! # Correlation
//!
//! Sub-responses are paired with requests by position: the n-th part of the
//! response resolves the n-th issued request. `Content-ID` values are exposed on
//! each result but play no part in pairing, so the server must answer in request
//! order.

use crate::client::{BatchConfig, BatchTransport, Deferred};
use crate::error::{BatchError, Result};
use crate::protocol::{BatchDecoder, BatchEncoder, HeaderList};
use crate::types::{BatchEnvelope, PendingRequest, RequestBody};
use http::Method;
use serde::Serialize;
use std::sync::Arc;
use url::Url;

/// Headers and body for one issued request.
///
/// ```
/// use http_batch::client::RequestOptions;
/// use serde_json::json;
///
/// let options = RequestOptions::new()
///     .header("If-Match", "\"v3\"")
///     .json(&json!({ "favorite_food": "butter chicken" }))
///     .unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    headers: HeaderList,
    body: RequestBody,
}

impl RequestOptions {
    /// No headers, no body.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, replacing one of the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replace all headers.
    pub fn headers(mut self, headers: HeaderList) -> Self {
        self.headers = headers;
        self
    }

    /// Set a body.
    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a structured body, written as JSON when the batch is encoded.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self> {
        self.body = RequestBody::Json(serde_json::to_value(value)?);
        Ok(self)
    }
}

/// What a finalized batch sent and received.
#[derive(Debug, Clone)]
pub struct BatchSummary {
    /// The envelope that was POSTed.
    pub envelope: BatchEnvelope,
    /// Status of the envelope response.
    pub status: u16,
    /// Headers of the envelope response.
    pub response_headers: HeaderList,
    /// Number of deferred results resolved.
    pub resolved: usize,
}

/// A batch under construction against one batch endpoint.
pub struct BatchSession {
    endpoint: Url,
    transport: Arc<dyn BatchTransport>,
    encoder: BatchEncoder,
    decoder: BatchDecoder,
    requests: Vec<PendingRequest>,
    results: Vec<Deferred>,
    enable_logging: bool,
}

impl BatchSession {
    /// Open a session posting to `endpoint` through `transport`.
    pub fn new(endpoint: Url, transport: Arc<dyn BatchTransport>, config: &BatchConfig) -> Self {
        BatchSession {
            endpoint,
            transport,
            encoder: BatchEncoder::new()
                .with_subtype(config.multipart_subtype.clone())
                .with_request_target(config.request_target),
            decoder: BatchDecoder::new(),
            requests: Vec::new(),
            results: Vec::new(),
            enable_logging: config.enable_logging,
        }
    }

    /// The batch endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Requests queued so far, in issue order.
    pub fn pending(&self) -> &[PendingRequest] {
        &self.requests
    }

    /// Number of queued requests.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Whether nothing has been queued.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Rewrite `path` onto the endpoint's scheme, host and port.
    ///
    /// `path` is resolved against the endpoint URL with RFC 3986 reference
    /// resolution, then only the resolved path and query are kept. So:
    ///
    /// - an absolute URL keeps its path and query but loses its origin
    /// - `.` and `..` segments are collapsed (`/a/../b` becomes `/b`)
    /// - a relative path resolves against the endpoint's directory
    /// - the fragment is dropped
    ///
    /// An empty or query-only `path` would resolve to the batch endpoint itself
    /// and is rejected with [`BatchError::Usage`].
    ///
    /// ```
    /// # use http_batch::client::BatchClient;
    /// let session = BatchClient::new().session("https://api.example.com/batch").unwrap();
    /// let url = session.rewrite_target("http://elsewhere.test/person/bob?full=1#top").unwrap();
    /// assert_eq!(url.as_str(), "https://api.example.com/person/bob?full=1");
    /// ```
    pub fn rewrite_target(&self, path: &str) -> Result<Url> {
        let resolved = self.endpoint.join(path)?;
        if resolved.path() == self.endpoint.path() {
            return Err(BatchError::Usage(format!(
                "Request target {:?} resolves to the batch endpoint {}",
                path,
                self.endpoint.path()
            )));
        }
        let mut target = self.endpoint.clone();
        target.set_path(resolved.path());
        target.set_query(resolved.query());
        target.set_fragment(None);
        Ok(target)
    }

    /// Queue a request and return the handle to its eventual response.
    ///
    /// # Errors
    ///
    /// - [`BatchError::InvalidUrl`] if `path` cannot be resolved
    /// - [`BatchError::HeaderParse`] if a header cannot be written on the wire
    /// - [`BatchError::Usage`] if `path` resolves to the batch endpoint itself
    pub fn issue(&mut self, method: Method, path: &str, options: RequestOptions) -> Result<Deferred> {
        options.headers.validate()?;
        let url = self.rewrite_target(path)?;

        let request = PendingRequest::new(method, url)
            .with_headers(options.headers)
            .with_body(options.body);
        tracing::debug!(
            "queued {} {} as batch item {}",
            request.method,
            request.url,
            self.requests.len()
        );

        let deferred = Deferred::new();
        self.requests.push(request);
        self.results.push(deferred.clone());
        Ok(deferred)
    }

    /// Queue a GET request.
    pub fn get(&mut self, path: &str, options: RequestOptions) -> Result<Deferred> {
        self.issue(Method::GET, path, options)
    }

    /// Queue a POST request.
    pub fn post(&mut self, path: &str, options: RequestOptions) -> Result<Deferred> {
        self.issue(Method::POST, path, options)
    }

    /// Queue a PUT request.
    pub fn put(&mut self, path: &str, options: RequestOptions) -> Result<Deferred> {
        self.issue(Method::PUT, path, options)
    }

    /// Queue a PATCH request.
    pub fn patch(&mut self, path: &str, options: RequestOptions) -> Result<Deferred> {
        self.issue(Method::PATCH, path, options)
    }

    /// Queue a DELETE request.
    pub fn delete(&mut self, path: &str, options: RequestOptions) -> Result<Deferred> {
        self.issue(Method::DELETE, path, options)
    }

    /// Send the batch and resolve every deferred result.
    ///
    /// Performs exactly one POST to the endpoint. On any error no result is
    /// resolved.
    ///
    /// # Errors
    ///
    /// - [`BatchError::EmptyBatch`] if nothing was issued; nothing is sent
    /// - [`BatchError::Http`] if the envelope request got no response
    /// - [`BatchError::HttpStatus`] if the envelope response has a failing status
    /// - [`BatchError::MalformedResponse`] if the reply cannot be decoded or its
    ///   part count differs from the number of issued requests
    pub async fn finalize(mut self) -> Result<BatchSummary> {
        let requests = std::mem::take(&mut self.requests);
        let results = std::mem::take(&mut self.results);

        if requests.is_empty() {
            return Err(BatchError::EmptyBatch);
        }

        let envelope = self.encoder.encode(&requests)?;
        if self.enable_logging {
            tracing::info!(
                "sending batch of {} requests ({} bytes) to {}",
                requests.len(),
                envelope.body.len(),
                self.endpoint
            );
        }

        let response = self
            .transport
            .post(&self.endpoint, &envelope.headers, envelope.body.clone())
            .await?;

        if response.is_failure() {
            return Err(BatchError::HttpStatus {
                status: response.status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            });
        }

        let parts = self.decoder.decode(&response.headers, &response.body)?;
        if parts.len() != results.len() {
            return Err(BatchError::malformed(format!(
                "expected {} response parts, got {}",
                results.len(),
                parts.len()
            )));
        }

        let resolved = parts.len();
        for (deferred, part) in results.iter().zip(parts) {
            deferred.resolve(part);
        }

        if self.enable_logging {
            tracing::info!(
                "batch to {} completed with status {}, {} results resolved",
                self.endpoint,
                response.status,
                resolved
            );
        }

        Ok(BatchSummary {
            envelope,
            status: response.status,
            response_headers: response.headers,
            resolved,
        })
    }
}

impl Drop for BatchSession {
    fn drop(&mut self) {
        if self.enable_logging && !self.requests.is_empty() {
            tracing::warn!(
                "batch session for {} dropped with {} unsent requests",
                self.endpoint,
                self.requests.len()
            );
        }
    }
}

impl std::fmt::Debug for BatchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchSession")
            .field("endpoint", &self.endpoint.as_str())
            .field("requests", &self.requests.len())
            .finish()
    }
}
