//! Client configuration.

use crate::protocol::constants::media_types;
use crate::types::RequestTarget;
use serde::{Deserialize, Serialize};

/// Configuration for [`BatchClient`](super::BatchClient).
///
/// Missing fields take their defaults when deserialized.
///
/// ```
/// use http_batch::client::BatchConfig;
///
/// let config: BatchConfig = serde_json::from_str(r#"{"request_timeout_ms": 5000}"#).unwrap();
/// assert_eq!(config.request_timeout_ms, 5000);
/// assert_eq!(config.multipart_subtype, "mixed");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Timeout of the outbound envelope request.
    pub request_timeout_ms: u64,
    /// Idle connections kept per host.
    pub max_total_connections: u32,
    /// Proxy for the envelope request; empty for none.
    pub proxy_url: String,
    /// Emit `info`/`warn` events for batch dispatch and cleanup.
    pub enable_logging: bool,
    /// Envelope subtype, as in `multipart/{subtype}`.
    pub multipart_subtype: String,
    /// How sub-request lines spell their target.
    pub request_target: RequestTarget,
    /// User-Agent of the envelope request.
    pub user_agent: Option<String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            request_timeout_ms: 30_000,
            max_total_connections: 10,
            proxy_url: String::new(),
            enable_logging: true,
            multipart_subtype: media_types::DEFAULT_MULTIPART_SUBTYPE.to_string(),
            request_target: RequestTarget::Absolute,
            user_agent: None,
        }
    }
}
