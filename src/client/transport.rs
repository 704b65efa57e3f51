//! Outbound transport for batch envelopes.
//!
//! A session needs exactly one capability from an HTTP client: POST a body with
//! some headers to a URL and hand back status, headers and body. That capability
//! is the [`BatchTransport`] trait; [`ReqwestTransport`] implements it on top of
//! a pooled `reqwest::Client`.

use crate::client::BatchConfig;
use crate::error::{BatchError, Result};
use crate::protocol::HeaderList;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use url::Url;

/// Response to an envelope POST.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderList,
    /// Raw response body
    pub body: Bytes,
}

impl TransportResponse {
    /// Whether the status signals failure of the envelope request itself.
    pub fn is_failure(&self) -> bool {
        self.status >= 400
    }
}

/// Something that can perform the single outbound POST of a batch.
#[async_trait]
pub trait BatchTransport: Send + Sync {
    /// POST `body` with `headers` to `url`.
    ///
    /// Only failures to obtain a response are errors here. A response with a
    /// failing status is returned as-is and judged by the session.
    async fn post(&self, url: &Url, headers: &HeaderList, body: Bytes)
        -> Result<TransportResponse>;
}

/// [`BatchTransport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Wrap an existing reqwest client.
    pub fn new(client: reqwest::Client) -> Self {
        ReqwestTransport { client }
    }

    /// Build a client from `config`.
    ///
    /// A `proxy_url` that reqwest cannot parse is skipped with a warning; the
    /// timeout, pool and user agent settings still apply.
    pub fn from_config(config: &BatchConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(config.max_total_connections as usize);

        if !config.proxy_url.is_empty() {
            match reqwest::Proxy::all(&config.proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(e) => {
                    if config.enable_logging {
                        tracing::warn!("Ignoring invalid proxy {:?}: {}", config.proxy_url, e);
                    }
                }
            }
        }
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        Ok(ReqwestTransport {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl BatchTransport for ReqwestTransport {
    async fn post(
        &self,
        url: &Url,
        headers: &HeaderList,
        body: Bytes,
    ) -> Result<TransportResponse> {
        let mut req_builder = self.client.post(url.clone());
        for (name, value) in headers.iter() {
            req_builder = req_builder.header(name, value);
        }

        let response = req_builder
            .body(body)
            .send()
            .await
            .map_err(|e| BatchError::Http(e.to_string()))?;

        let status = response.status().as_u16();

        let mut response_headers = HeaderList::new();
        for (name, value) in response.headers() {
            // Opaque (non-UTF-8) bytes are kept lossily; the Content-Type must survive.
            let val = String::from_utf8_lossy(value.as_bytes());
            response_headers.append(name.as_str(), val.into_owned());
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| BatchError::Http(e.to_string()))?;

        Ok(TransportResponse {
            status,
            headers: response_headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_from_default_config() {
        assert!(ReqwestTransport::from_config(&BatchConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_proxy_is_skipped() {
        let config = BatchConfig {
            proxy_url: "not a url".to_string(),
            enable_logging: false,
            ..Default::default()
        };
        assert!(reqwest::Proxy::all(&config.proxy_url).is_err());
        assert!(ReqwestTransport::from_config(&config).is_ok());
    }

    #[test]
    fn test_failure_threshold() {
        let response = |status| TransportResponse {
            status,
            headers: HeaderList::new(),
            body: Bytes::new(),
        };
        assert!(!response(200).is_failure());
        assert!(!response(207).is_failure());
        assert!(response(400).is_failure());
        assert!(response(503).is_failure());
    }

    #[tokio::test]
    async fn test_post_roundtrip() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/batch")
            .match_header("content-type", "multipart/mixed; boundary=\"b\"")
            .match_body("--b--\r\n")
            .with_status(200)
            .with_header("content-type", "multipart/mixed; boundary=\"r\"")
            .with_body("--r--")
            .create_async()
            .await;

        let transport = ReqwestTransport::from_config(&BatchConfig::default()).unwrap();
        let url = Url::parse(&format!("{}/batch", server.url())).unwrap();
        let mut headers = HeaderList::new();
        headers.insert("Content-Type", "multipart/mixed; boundary=\"b\"");

        let response = transport
            .post(&url, &headers, Bytes::from_static(b"--b--\r\n"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, 200);
        assert_eq!(
            response.headers.get("Content-Type"),
            Some("multipart/mixed; boundary=\"r\"")
        );
        assert_eq!(&response.body[..], b"--r--");
    }

    #[tokio::test]
    async fn test_post_keeps_non_ascii_header_values() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = Url::parse(&format!("http://{}/batch", listener.local_addr().unwrap())).unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await.unwrap();
            let reply: &[u8] = b"HTTP/1.1 200 OK\r\n\
                X-Latin: caf\xe9\r\n\
                X-Utf8: caf\xc3\xa9\r\n\
                Content-Type: multipart/mixed; boundary=\"r\"\r\n\
                Content-Length: 5\r\n\
                Connection: close\r\n\r\n\
                --r--";
            socket.write_all(reply).await.unwrap();
        });

        let transport = ReqwestTransport::from_config(&BatchConfig::default()).unwrap();
        let response = transport
            .post(&url, &HeaderList::new(), Bytes::from_static(b"--b--\r\n"))
            .await
            .unwrap();
        server.await.unwrap();

        assert_eq!(response.headers.get("x-latin"), Some("caf\u{FFFD}"));
        assert_eq!(response.headers.get("x-utf8"), Some("café"));
        assert_eq!(
            response.headers.get("Content-Type"),
            Some("multipart/mixed; boundary=\"r\"")
        );
        assert_eq!(&response.body[..], b"--r--");
    }
}
