//! FOG Core - Media catalog, storage and range-aware audio streaming
//!
//! This crate provides the building blocks behind the platform's podcast
//! playback: the content-record catalog, local media storage, source
//! classification for proxied audio, and the streaming responder that turns
//! a media id plus a Range header into a framed, lazily-read response.

pub mod catalog;
pub mod config;
pub mod storage;
pub mod streaming;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use catalog::{CatalogError, InMemoryCatalog, MediaCatalog, MediaId, MediaResource};
pub use config::FogConfig;
pub use storage::{LocalStorage, StorageBackend, StorageError};
pub use streaming::{StreamRequest, StreamResponder, StreamResponse, StreamingError};

/// Core errors that can bubble up from any FOG subsystem.
#[derive(Debug, thiserror::Error)]
pub enum FogError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Streaming error: {0}")]
    Streaming(#[from] StreamingError),

    #[error("Remote error: {0}")]
    Remote(#[from] streaming::RemoteError),

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FogError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            FogError::Catalog(e) => match e {
                CatalogError::NotFound { id } => format!("Media {id} not found"),
                CatalogError::InvalidManifest { reason } => {
                    format!("Invalid catalog manifest: {reason}")
                }
                _ => "Catalog error occurred".to_string(),
            },
            FogError::Storage(_) => "Storage error occurred".to_string(),
            FogError::Streaming(e) => e.user_message(),
            FogError::Remote(_) => "Remote origin unavailable".to_string(),
            FogError::Configuration { .. } => "Configuration error occurred".to_string(),
            FogError::Io(_) => "File system error occurred".to_string(),
        }
    }

    /// Checks if this error is due to user input validation.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            FogError::Configuration { .. }
                | FogError::Catalog(CatalogError::InvalidManifest { .. })
                | FogError::Streaming(StreamingError::UnsupportedSource { .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, FogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_delegates_to_streaming() {
        let error = FogError::from(StreamingError::NoAudioAvailable {
            resource_id: MediaId::from(43u64),
        });
        assert_eq!(error.user_message(), "Audio URL not available");
        assert!(!error.is_user_error());
    }

    #[test]
    fn test_invalid_manifest_is_user_error() {
        let error = FogError::from(CatalogError::InvalidManifest {
            reason: "expected array".to_string(),
        });
        assert!(error.is_user_error());
        assert!(error.user_message().contains("expected array"));
    }
}
