//! Range-aware media streaming.
//!
//! Reference classification, Range header grammar, MIME inference and the
//! responder that ties them to a catalog, local storage and remote origins.

pub mod mime;
pub mod range;
pub mod remote;
pub mod responder;
pub mod source;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;

use axum::http::StatusCode;
pub use mime::{DEFAULT_AUDIO_MIME, extension_for_mime, mime_for_extension, resolve_mime_type};
pub use range::{ByteRange, RangeError, RangeSpec, parse_range_header};
pub use remote::{HttpRemoteFetcher, RemoteError, RemoteFetcher, RemoteResponse};
pub use responder::{
    Disposition, EXPOSED_MEDIA_HEADERS, StreamRequest, StreamResponder, StreamResponse,
    apply_allowed_origin, counts_as_playback_start,
};
pub use source::{
    MediaSource, SourceError, SourceResolver, extract_drive_file_id, remote_file_stem,
};

use crate::catalog::{CatalogError, MediaId};
use crate::storage::StorageError;

/// Errors that end a streaming request before any body is sent.
#[derive(Debug, thiserror::Error)]
pub enum StreamingError {
    #[error("Media {resource_id} not found")]
    NotFound { resource_id: MediaId },

    #[error("Audio URL not available")]
    NoAudioAvailable { resource_id: MediaId },

    #[error("Media {resource_id} references missing stored file {path}")]
    StorageInconsistency { resource_id: MediaId, path: String },

    #[error("Media {resource_id} has an unsupported source: {source}")]
    UnsupportedSource {
        resource_id: MediaId,
        source: SourceError,
    },

    #[error("Requested range not satisfiable for {length} bytes")]
    RangeNotSatisfiable { length: u64 },

    #[error("Upstream {url} unavailable: {reason}")]
    UpstreamUnavailable { url: String, reason: String },

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl StreamingError {
    /// HTTP status this failure maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            StreamingError::NotFound { .. }
            | StreamingError::NoAudioAvailable { .. }
            | StreamingError::StorageInconsistency { .. } => StatusCode::NOT_FOUND,
            StreamingError::UnsupportedSource { .. } => StatusCode::BAD_REQUEST,
            StreamingError::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            StreamingError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            StreamingError::Catalog(CatalogError::NotFound { .. }) => StatusCode::NOT_FOUND,
            StreamingError::Catalog(_) | StreamingError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show to listeners; internal paths and URLs stay in logs.
    pub fn user_message(&self) -> String {
        match self {
            StreamingError::NotFound { .. } | StreamingError::Catalog(CatalogError::NotFound { .. }) => {
                "Podcast not found".to_string()
            }
            StreamingError::NoAudioAvailable { .. } => "Audio URL not available".to_string(),
            StreamingError::StorageInconsistency { .. } => {
                "Audio file not found in storage".to_string()
            }
            StreamingError::UnsupportedSource { .. } => "Unsupported audio source".to_string(),
            StreamingError::RangeNotSatisfiable { .. } => {
                "Requested range not satisfiable".to_string()
            }
            StreamingError::UpstreamUnavailable { .. } => "Failed to stream audio".to_string(),
            StreamingError::Catalog(_) | StreamingError::Storage(_) => {
                "Internal server error".to_string()
            }
        }
    }

    /// `Content-Range` value a 416 response must carry.
    pub fn content_range(&self) -> Option<String> {
        match self {
            StreamingError::RangeNotSatisfiable { length } => Some(format!("bytes */{length}")),
            _ => None,
        }
    }
}

impl From<RangeError> for StreamingError {
    fn from(error: RangeError) -> Self {
        match error {
            RangeError::NotSatisfiable { total_size } => StreamingError::RangeNotSatisfiable {
                length: total_size,
            },
        }
    }
}

pub type StreamingResult<T> = Result<T, StreamingError>;
