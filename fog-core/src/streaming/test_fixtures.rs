//! Scripted remote origin for responder tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use parking_lot::Mutex;
use url::Url;

use super::remote::{RemoteError, RemoteFetcher, RemoteResponse};

#[derive(Debug, Clone)]
enum ScriptedReply {
    Respond {
        status: u16,
        body: Vec<u8>,
        chunk_size: usize,
    },
    Refuse,
}

/// [`RemoteFetcher`] answering from a fixed script, recording every request.
#[derive(Debug, Clone, Default)]
pub struct FakeRemoteFetcher {
    replies: Arc<Mutex<HashMap<String, ScriptedReply>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakeRemoteFetcher {
    /// Creates a fetcher that refuses every URL until scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `url` with `status` and `body`, delivered in `chunk_size` pieces.
    pub fn respond(&self, url: &str, status: u16, body: Vec<u8>, chunk_size: usize) -> &Self {
        self.replies.lock().insert(
            url.to_string(),
            ScriptedReply::Respond {
                status,
                body,
                chunk_size: chunk_size.max(1),
            },
        );
        self
    }

    /// Fails connections to `url`.
    pub fn refuse(&self, url: &str) -> &Self {
        self.replies
            .lock()
            .insert(url.to_string(), ScriptedReply::Refuse);
        self
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl RemoteFetcher for FakeRemoteFetcher {
    async fn stream_get(&self, url: &Url) -> Result<RemoteResponse, RemoteError> {
        self.requests.lock().push(url.to_string());
        let reply = self.replies.lock().get(url.as_str()).cloned();

        match reply {
            Some(ScriptedReply::Respond {
                status,
                body,
                chunk_size,
            }) => {
                let content_length = Some(body.len() as u64);
                let chunks: Vec<Result<Bytes, std::io::Error>> = body
                    .chunks(chunk_size)
                    .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
                    .collect();

                Ok(RemoteResponse {
                    status,
                    content_length,
                    body: Box::pin(stream::iter(chunks)),
                })
            }
            Some(ScriptedReply::Refuse) | None => Err(RemoteError::Connect {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            }),
        }
    }
}
