//! Batching HTTP client.
//!
//! This module lets callers queue ordinary HTTP requests, send them to a batch
//! endpoint as one multipart request, and read each sub-response afterwards.
//!
//! # Module Organization
//!
//! ```text
//! client/
//! ├── fetch     - BatchClient, the session factory
//! ├── session   - BatchSession: issue, finalize
//! ├── deferred  - Deferred: the not-yet-available response
//! ├── transport - BatchTransport trait and its reqwest implementation
//! └── config    - Client configuration
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`BatchClient`] | Opens sessions, runs scoped batches |
//! | [`BatchSession`] | Queues requests and sends the batch once |
//! | [`Deferred`] | Handle to one sub-response |
//! | [`RequestOptions`] | Headers and body of one issued request |
//! | [`BatchTransport`] | The one outbound POST |
//! | [`BatchConfig`] | Client configuration options |
//!
//! # Examples
//!
//! ## Creating a Client
//!
//! ```
//! use http_batch::client::{BatchClient, BatchConfig};
//!
//! // Default configuration
//! let client = BatchClient::new();
//!
//! // Custom configuration
//! let config = BatchConfig {
//!     request_timeout_ms: 5_000,
//!     multipart_subtype: "mixed".into(),
//!     ..Default::default()
//! };
//! let client = BatchClient::with_config(config);
//! ```
//!
//! ## Queuing Requests
//!
//! ```
//! use http_batch::client::{BatchClient, RequestOptions};
//!
//! let mut session = BatchClient::new().session("http://localhost:5000/batch").unwrap();
//! let people = session.get("/people", RequestOptions::new()).unwrap();
//!
//! // nothing has been sent yet
//! assert!(people.status().is_err());
//! assert_eq!(session.pending()[0].url.as_str(), "http://localhost:5000/people");
//! ```

mod config;
mod deferred;
mod fetch;
mod session;
mod transport;

pub use config::BatchConfig;
pub use deferred::Deferred;
pub use fetch::BatchClient;
pub use session::{BatchSession, BatchSummary, RequestOptions};
pub use transport::{BatchTransport, ReqwestTransport, TransportResponse};
