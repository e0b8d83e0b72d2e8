//! Content-record catalog for streamable media.
//!
//! The catalog owns the records that map an opaque media id to where its
//! bytes live, plus the play counter the streaming responder bumps when a
//! playback starts. Storage of the bytes themselves is not its concern.

pub mod memory;

use std::fmt;

use async_trait::async_trait;
pub use memory::InMemoryCatalog;
use serde::{Deserialize, Serialize};

/// Opaque identifier of a media record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaId(String);

impl MediaId {
    /// Creates an id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MediaId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for MediaId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for MediaId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// A content record with an audio reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaResource {
    /// Record identifier
    pub id: MediaId,
    /// Display title
    #[serde(default)]
    pub title: String,
    /// Local storage path or remote URL of the audio, if any
    #[serde(default)]
    pub source_location: Option<String>,
    /// MIME type recorded alongside the reference
    #[serde(default)]
    pub mime_hint: Option<String>,
    /// Number of playback starts observed
    #[serde(default)]
    pub play_count: u64,
}

impl MediaResource {
    /// Creates a record with no plays yet.
    pub fn new(
        id: impl Into<MediaId>,
        title: impl Into<String>,
        source_location: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            source_location,
            mime_hint: None,
            play_count: 0,
        }
    }

    /// Sets the recorded MIME hint.
    pub fn with_mime_hint(mut self, mime: impl Into<String>) -> Self {
        self.mime_hint = Some(mime.into());
        self
    }

    /// Returns the trimmed audio reference, treating blank strings as absent.
    pub fn audio_reference(&self) -> Option<&str> {
        self.source_location
            .as_deref()
            .map(str::trim)
            .filter(|reference| !reference.is_empty())
    }
}

/// Errors raised by catalog implementations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Record does not exist
    #[error("Media record {id} not found")]
    NotFound {
        /// Id that was looked up
        id: MediaId,
    },

    /// Manifest could not be parsed
    #[error("Invalid catalog manifest: {reason}")]
    InvalidManifest {
        /// Parser message
        reason: String,
    },

    /// Backing store failed
    #[error("Catalog backend error: {reason}")]
    Backend {
        /// Description of the failure
        reason: String,
    },

    /// Underlying I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Lookup and bookkeeping interface over the content-record store.
#[async_trait]
pub trait MediaCatalog: Send + Sync {
    /// Looks up a record by id.
    ///
    /// # Errors
    ///
    /// - `CatalogError::Backend` - The store could not be queried
    async fn resolve(&self, id: &MediaId) -> CatalogResult<Option<MediaResource>>;

    /// Records one playback start and returns the new count.
    ///
    /// # Errors
    ///
    /// - `CatalogError::NotFound` - The record vanished between lookup and update
    /// - `CatalogError::Backend` - The store could not be updated
    async fn increment_play_count(&self, id: &MediaId) -> CatalogResult<u64>;

    /// Returns every record, ordered by id.
    ///
    /// # Errors
    ///
    /// - `CatalogError::Backend` - The store could not be queried
    async fn list(&self) -> CatalogResult<Vec<MediaResource>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_id_conversions() {
        assert_eq!(MediaId::from(42u64).as_str(), "42");
        assert_eq!(MediaId::from("ep-7").to_string(), "ep-7");
        assert_eq!(MediaId::new(String::from("x")), MediaId::from("x"));
    }

    #[test]
    fn test_blank_reference_is_absent() {
        let blank = MediaResource::new(1u64, "Blank", Some("   ".to_string()));
        assert_eq!(blank.audio_reference(), None);

        let missing = MediaResource::new(2u64, "Missing", None);
        assert_eq!(missing.audio_reference(), None);

        let present = MediaResource::new(3u64, "Present", Some(" a.mp3 ".to_string()));
        assert_eq!(present.audio_reference(), Some("a.mp3"));
    }

    #[test]
    fn test_resource_deserializes_with_defaults() {
        let resource: MediaResource =
            serde_json::from_str(r#"{"id": "42", "source_location": "podcast42.mp3"}"#).unwrap();

        assert_eq!(resource.id, MediaId::from(42u64));
        assert_eq!(resource.play_count, 0);
        assert!(resource.mime_hint.is_none());
        assert!(resource.title.is_empty());
    }
}
