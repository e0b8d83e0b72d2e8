//! Storage layer for uploaded media bytes.
//!
//! Defines the byte-addressable backend interface the streaming responder
//! reads from, with a local filesystem implementation rooted at a
//! configured directory.

pub mod local;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;

use std::path::PathBuf;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;
pub use local::LocalStorage;
use serde::Serialize;

/// Lazy, finite sequence of byte chunks bound to one response.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Byte-addressable media storage.
///
/// Paths are backend-relative; how they map to physical locations is the
/// backend's concern.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Whether the path names stored bytes.
    async fn exists(&self, path: &str) -> bool;

    /// Total stored length of the path in bytes.
    ///
    /// # Errors
    ///
    /// - `StorageError::NotFound` - Nothing is stored at the path
    /// - `StorageError::InvalidPath` - Path escapes the backend root
    /// - `StorageError::Io` - Metadata could not be read
    async fn size(&self, path: &str) -> StorageResult<u64>;

    /// Opens the inclusive byte window `start..=end` as a chunked stream.
    ///
    /// Nothing beyond the first chunk is read until the stream is polled.
    ///
    /// # Errors
    ///
    /// - `StorageError::NotFound` - Nothing is stored at the path
    /// - `StorageError::InvalidRange` - Window is inverted or past the end
    /// - `StorageError::Io` - File could not be opened or positioned
    async fn open_range(&self, path: &str, start: u64, end: u64) -> StorageResult<ByteStream>;

    /// Short name of this backend, for logs.
    fn backend_type(&self) -> &'static str;
}

/// Errors that occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Nothing stored at the path
    #[error("Stored file not found: {path}")]
    NotFound {
        /// Backend-relative path that was requested
        path: String,
    },

    /// Path is absolute or climbs out of the storage root
    #[error("Invalid storage path {path}: {reason}")]
    InvalidPath {
        /// Offending path
        path: String,
        /// Why it was rejected
        reason: String,
    },

    /// Byte window does not fit the stored length
    #[error("Invalid byte window {start}-{end} for {size} stored bytes")]
    InvalidRange {
        /// First requested byte
        start: u64,
        /// Last requested byte
        end: u64,
        /// Stored length
        size: u64,
    },

    /// Standard I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Usage summary of a storage root.
#[derive(Debug, Clone, Serialize)]
pub struct StorageInfo {
    /// Directory that was scanned
    pub storage_path: PathBuf,
    /// Number of regular files found
    pub total_files: u64,
    /// Sum of their sizes
    pub total_size_bytes: u64,
    /// When the scan finished
    pub scanned_at: DateTime<Utc>,
}

impl StorageInfo {
    /// Total size in mebibytes, rounded to two decimals.
    pub fn total_size_mb(&self) -> f64 {
        (self.total_size_bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_size_mb_rounding() {
        let info = StorageInfo {
            storage_path: PathBuf::from("/srv"),
            total_files: 3,
            total_size_bytes: 1_572_864, // 1.5 MiB
            scanned_at: Utc::now(),
        };
        assert_eq!(info.total_size_mb(), 1.5);
    }
}
