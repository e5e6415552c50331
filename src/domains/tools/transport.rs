//! Outbound HTTP transport.
//!
//! The executor talks to upstream APIs through [`HttpTransport`] so retry and
//! timeout behavior can be exercised without a network.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use reqwest::header::HeaderMap;
use thiserror::Error;

use super::request::OutboundRequest;

/// A network-level failure: nothing usable came back.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct SendError(pub String);

/// Raw upstream response, body fully read.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Sends one request and reads the whole response.
///
/// Implementations must be safe for concurrent use without external locking.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, SendError>;
}

/// [`HttpTransport`] backed by a pooled `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Wrap an existing client, sharing its connection pool.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, SendError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| SendError(e.to_string()))?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| SendError(format!("failed to read response body: {}", e)))?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}
