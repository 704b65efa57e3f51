#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! # http_batch: many HTTP requests, one round trip
//!
//! This crate coalesces independent HTTP requests against one service into a
//! single `multipart/mixed` POST. Each part of the batch is a complete HTTP/1.1
//! request typed `application/http`; the server answers with a multipart response
//! whose parts are complete HTTP/1.1 responses, in the same order.
//!
//! ## Overview
//!
//! A batch moves through three steps:
//!
//! 1. **Issue** - requests are queued on a session; each returns a [`Deferred`]
//! 2. **Encode and send** - the queue is written as one multipart envelope and
//!    POSTed to the batch endpoint
//! 3. **Decode and resolve** - the multipart reply is unpacked and the n-th part
//!    resolves the n-th [`Deferred`]
//!
//! Sub-requests are never executed concurrently by the client. Batching here is
//! coalescing on the wire.
//!
//! ## Client Usage
//!
//! ```ignore
//! use http_batch::{BatchClient, RequestOptions};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BatchClient::new();
//!
//!     let mut session = client.session("http://localhost:5000/batch")?;
//!     let alice = session.patch(
//!         "/person/alice",
//!         RequestOptions::new().json(&json!({"favorite_food": "panang curry"}))?,
//!     )?;
//!     session.finalize().await?;
//!
//!     println!("{}: {}", alice.status()?, alice.text()?);
//!     Ok(())
//! }
//! ```
//!
//! ## Wire Format
//!
//! ```text
//! POST /batch HTTP/1.1
//! Content-Type: multipart/mixed; boundary="batch_1f0e..."
//! MIME-Version: 1.0
//!
//! --batch_1f0e...
//! Content-Type: application/http
//! MIME-Version: 1.0
//!
//! PATCH http://localhost:5000/person/alice HTTP/1.1
//! Content-Type: application/json
//! Content-Length: 32
//!
//! {"favorite_food":"panang curry"}
//! --batch_1f0e...--
//! ```
//!
//! ## Module Structure
//!
//! - **[types]** - Pending requests, envelopes and decoded parts
//! - **[error]** - Error types and result handling
//! - **[client]** - Sessions, deferred results and the HTTP transport
//! - **[protocol]** - Multipart encoder, decoder and header parsing

pub mod client;
pub mod error;
pub mod protocol;
pub mod types;

pub use client::{BatchClient, BatchConfig, BatchSession, Deferred, RequestOptions};
pub use error::{BatchError, Result};
pub use protocol::{BatchDecoder, BatchEncoder, HeaderList};
pub use types::{BatchEnvelope, DecodedPart, PendingRequest, RequestBody};
