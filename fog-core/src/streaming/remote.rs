//! Remote origin access for proxied media.
//!
//! The responder only sees the [`RemoteFetcher`] trait so tests can swap in
//! a scripted fake instead of touching the network.

use std::fmt;

use async_trait::async_trait;
use futures::TryStreamExt;
use tracing::debug;
use url::Url;

use crate::config::RemoteConfig;
use crate::storage::ByteStream;

/// Upstream response whose body has not been read yet.
pub struct RemoteResponse {
    /// Status code returned by the origin
    pub status: u16,
    /// Length the origin announced, if any
    pub content_length: Option<u64>,
    /// Body chunks, relayed as they arrive
    pub body: ByteStream,
}

impl fmt::Debug for RemoteResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteResponse")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Errors opening a stream to a remote origin.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Origin could not be reached or refused the connection
    #[error("Failed to reach {url}: {reason}")]
    Connect {
        /// URL that was requested
        url: String,
        /// Transport error message
        reason: String,
    },

    /// HTTP client could not be constructed
    #[error("HTTP client error: {reason}")]
    Client {
        /// Builder error message
        reason: String,
    },
}

/// Opens streaming GET requests against remote origins.
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    /// Starts a GET and returns once response headers are in.
    ///
    /// Non-success statuses are returned, not raised; the caller decides
    /// what counts as unavailable.
    ///
    /// # Errors
    ///
    /// - `RemoteError::Connect` - Connection failed before any response
    async fn stream_get(&self, url: &Url) -> Result<RemoteResponse, RemoteError>;
}

/// [`RemoteFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpRemoteFetcher {
    client: reqwest::Client,
}

impl HttpRemoteFetcher {
    /// Builds a fetcher with the configured timeout and user agent.
    ///
    /// # Errors
    ///
    /// - `RemoteError::Client` - TLS backend or client setup failed
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| RemoteError::Client {
                reason: e.to_string(),
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl RemoteFetcher for HttpRemoteFetcher {
    async fn stream_get(&self, url: &Url) -> Result<RemoteResponse, RemoteError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| RemoteError::Connect {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let content_length = response.content_length();
        debug!(
            "Upstream {} answered {} (length {:?})",
            url, status, content_length
        );

        let body = response.bytes_stream().map_err(std::io::Error::other);

        Ok(RemoteResponse {
            status,
            content_length,
            body: Box::pin(body),
        })
    }
}
