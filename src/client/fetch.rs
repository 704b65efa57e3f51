//! Batch client: entry point for opening sessions.
//!
//! # Examples
//!
//! ## Scoped batch
//!
//! ```ignore
//! use http_batch::client::{BatchClient, RequestOptions};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BatchClient::new();
//!
//!     let (alice, bob) = client
//!         .batch("http://localhost:5000/batch", |b| {
//!             let alice = b.patch("/person/alice", RequestOptions::new().json(&json!({"favorite_food": "panang curry"}))?)?;
//!             let bob = b.patch("/person/bob", RequestOptions::new().json(&json!({"favorite_food": "butter chicken"}))?)?;
//!             Ok((alice, bob))
//!         })
//!         .await?;
//!
//!     println!("{} {}", alice.status()?, alice.text()?);
//!     println!("{} {}", bob.status()?, bob.text()?);
//!     Ok(())
//! }
//! ```
//!
//! ## Explicit session
//!
//! ```ignore
//! let mut session = client.session("http://localhost:5000/batch")?;
//! let people = session.get("/people", RequestOptions::new())?;
//! let summary = session.finalize().await?;
//! assert_eq!(summary.resolved, 1);
//! ```

use crate::client::{BatchConfig, BatchSession, BatchTransport, ReqwestTransport};
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Factory for [`BatchSession`]s sharing one transport and configuration.
///
/// Cloning is cheap and shares the underlying connection pool.
#[derive(Clone)]
pub struct BatchClient {
    transport: Arc<dyn BatchTransport>,
    config: Arc<BatchConfig>,
}

impl BatchClient {
    /// Create a batch client with default configuration
    pub fn new() -> Self {
        Self::with_config(BatchConfig::default())
    }

    /// Create a batch client with custom configuration
    ///
    /// An unparsable `proxy_url` is ignored. If reqwest still cannot build a
    /// client, the fallback client keeps the configured request timeout.
    pub fn with_config(config: BatchConfig) -> Self {
        let transport = match ReqwestTransport::from_config(&config) {
            Ok(transport) => transport,
            Err(e) => {
                if config.enable_logging {
                    tracing::warn!("Falling back to a minimal HTTP client: {}", e);
                }
                let client = reqwest::Client::builder()
                    .timeout(Duration::from_millis(config.request_timeout_ms))
                    .build()
                    .unwrap_or_default();
                ReqwestTransport::new(client)
            }
        };
        Self::with_transport(Arc::new(transport), config)
    }

    /// Create a batch client sending envelopes through `transport`
    pub fn with_transport(transport: Arc<dyn BatchTransport>, config: BatchConfig) -> Self {
        BatchClient {
            transport,
            config: Arc::new(config),
        }
    }

    /// Open a session against the batch `endpoint`.
    pub fn session(&self, endpoint: &str) -> Result<BatchSession> {
        let endpoint = Url::parse(endpoint)?;
        Ok(BatchSession::new(
            endpoint,
            self.transport.clone(),
            &self.config,
        ))
    }

    /// Run `f` against a fresh session, then send the batch.
    ///
    /// The session is always finalized and released before this returns:
    ///
    /// - if `f` succeeds, the batch is sent and any finalize error is returned
    /// - if `f` fails after queuing requests, the batch is still sent; `f`'s error
    ///   is returned and a finalize failure is only logged
    /// - if `f` fails before queuing anything, nothing is sent
    pub async fn batch<F, R>(&self, endpoint: &str, f: F) -> Result<R>
    where
        F: FnOnce(&mut BatchSession) -> Result<R>,
    {
        let mut session = self.session(endpoint)?;
        match f(&mut session) {
            Ok(value) => {
                session.finalize().await?;
                Ok(value)
            }
            Err(e) => {
                if !session.is_empty() {
                    if let Err(finalize_err) = session.finalize().await {
                        if self.config.enable_logging {
                            tracing::warn!(
                                "Batch finalize failed while unwinding from '{}': {}",
                                e,
                                finalize_err
                            );
                        }
                    }
                }
                Err(e)
            }
        }
    }

    /// Get the client configuration
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }
}

impl Default for BatchClient {
    fn default() -> Self {
        Self::new()
    }
}
