//! Local filesystem storage backend.
//!
//! Resolves backend-relative paths under a single root directory and serves
//! byte windows from them as lazily read, fixed-size chunks.

use std::io::SeekFrom;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, warn};

use super::{ByteStream, StorageBackend, StorageError, StorageInfo, StorageResult};
use crate::config::StorageConfig;

/// Storage backend over a directory on local disk.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    chunk_size: usize,
}

impl LocalStorage {
    /// Creates a backend rooted at `root` reading `chunk_size` bytes per chunk.
    pub fn new(root: impl Into<PathBuf>, chunk_size: usize) -> Self {
        Self {
            root: root.into(),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Creates a backend from storage configuration.
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.root.clone(), config.chunk_size)
    }

    /// Root directory paths resolve under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Bytes per yielded chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Maps a backend-relative path onto the root.
    ///
    /// Purely lexical; symlinks are checked by the filesystem-facing
    /// operations, which only serve targets that canonicalize under the root.
    ///
    /// # Errors
    ///
    /// - `StorageError::InvalidPath` - Path is empty, absolute, or contains `..`
    pub fn resolve_path(&self, relative: &str) -> StorageResult<PathBuf> {
        let invalid = |reason: &str| StorageError::InvalidPath {
            path: relative.to_string(),
            reason: reason.to_string(),
        };

        let mut resolved = self.root.clone();
        let mut depth = 0usize;
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => {
                    resolved.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                Component::ParentDir => return Err(invalid("parent directory reference")),
                Component::RootDir | Component::Prefix(_) => {
                    return Err(invalid("absolute path"));
                }
            }
        }

        if depth == 0 {
            return Err(invalid("empty path"));
        }
        Ok(resolved)
    }

    /// Walks the root and totals file count and size.
    ///
    /// A missing root reports zero files.
    ///
    /// # Errors
    ///
    /// - `StorageError::Io` - A directory could not be listed
    pub async fn storage_info(&self) -> StorageResult<StorageInfo> {
        let mut total_files = 0u64;
        let mut total_size_bytes = 0u64;
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    pending.push(entry.path());
                } else if file_type.is_file() {
                    total_files += 1;
                    total_size_bytes += entry.metadata().await?.len();
                }
            }
        }

        Ok(StorageInfo {
            storage_path: self.root.clone(),
            total_files,
            total_size_bytes,
            scanned_at: chrono::Utc::now(),
        })
    }

    /// Resolves `relative` through any symlinks, refusing targets outside
    /// the canonical root.
    async fn confined_path(&self, relative: &str) -> StorageResult<PathBuf> {
        let not_found = || StorageError::NotFound {
            path: relative.to_string(),
        };
        let full_path = self.resolve_path(relative)?;

        let root = match tokio::fs::canonicalize(&self.root).await {
            Ok(root) => root,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };
        let target = match tokio::fs::canonicalize(&full_path).await {
            Ok(target) => target,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };

        if !target.starts_with(&root) {
            warn!(
                "LocalStorage: {} links to {} outside {}",
                relative,
                target.display(),
                root.display()
            );
            return Err(StorageError::InvalidPath {
                path: relative.to_string(),
                reason: "resolves outside the storage root".to_string(),
            });
        }
        Ok(target)
    }

    async fn file_metadata(&self, path: &str) -> StorageResult<std::fs::Metadata> {
        let full_path = self.confined_path(path).await?;
        match tokio::fs::metadata(&full_path).await {
            Ok(metadata) if metadata.is_file() => Ok(metadata),
            Ok(_) => Err(StorageError::NotFound {
                path: path.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound {
                path: path.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

/// Streams `remaining` bytes from the file's current position.
fn chunked_file_stream(file: File, remaining: u64, chunk_size: usize) -> ByteStream {
    Box::pin(stream::unfold(
        (file, remaining),
        move |(mut file, remaining)| async move {
            if remaining == 0 {
                return None;
            }

            let to_read = remaining.min(chunk_size as u64) as usize;
            let mut buffer = vec![0u8; to_read];
            match file.read_exact(&mut buffer).await {
                Ok(_) => Some((Ok(Bytes::from(buffer)), (file, remaining - to_read as u64))),
                Err(e) => {
                    warn!("Stored file ended early with {} bytes unread: {}", remaining, e);
                    // Zero remaining ends the stream after surfacing the error
                    Some((Err(e), (file, 0)))
                }
            }
        },
    ))
}

#[async_trait]
impl StorageBackend for LocalStorage {
    async fn exists(&self, path: &str) -> bool {
        self.file_metadata(path).await.is_ok()
    }

    async fn size(&self, path: &str) -> StorageResult<u64> {
        Ok(self.file_metadata(path).await?.len())
    }

    async fn open_range(&self, path: &str, start: u64, end: u64) -> StorageResult<ByteStream> {
        let size = self.size(path).await?;
        if start > end || end >= size {
            return Err(StorageError::InvalidRange { start, end, size });
        }

        let mut file = File::open(self.confined_path(path).await?).await?;
        file.seek(SeekFrom::Start(start)).await?;

        debug!(
            "LocalStorage: streaming {}..={} of {} ({} bytes, {} byte chunks)",
            start,
            end,
            path,
            end - start + 1,
            self.chunk_size
        );

        Ok(chunked_file_stream(file, end - start + 1, self.chunk_size))
    }

    fn backend_type(&self) -> &'static str {
        "local_storage"
    }
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;

    use super::*;
    use crate::storage::test_fixtures::{audio_bytes, create_audio_fixture, create_temp_storage};

    async fn collect(stream: ByteStream) -> (Vec<u8>, usize) {
        let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();
        let count = chunks.len();
        (chunks.concat(), count)
    }

    #[test]
    fn test_resolve_path_rejects_escapes() {
        let storage = LocalStorage::new("/srv/fog", 8192);

        assert_eq!(
            storage.resolve_path("podcasts/audio/a.mp3").unwrap(),
            PathBuf::from("/srv/fog/podcasts/audio/a.mp3")
        );
        assert_eq!(
            storage.resolve_path("./a.mp3").unwrap(),
            PathBuf::from("/srv/fog/a.mp3")
        );
        assert!(matches!(
            storage.resolve_path("../secrets"),
            Err(StorageError::InvalidPath { .. })
        ));
        assert!(matches!(
            storage.resolve_path("/etc/passwd"),
            Err(StorageError::InvalidPath { .. })
        ));
        assert!(matches!(
            storage.resolve_path(""),
            Err(StorageError::InvalidPath { .. })
        ));
    }

    #[tokio::test]
    async fn test_exists_and_size() {
        let (_temp_dir, storage) = create_temp_storage(8192);
        create_audio_fixture(storage.root(), "podcasts/audio/a.mp3", 1024);

        assert!(storage.exists("podcasts/audio/a.mp3").await);
        assert!(!storage.exists("podcasts/audio/missing.mp3").await);
        // directories are not stored files
        assert!(!storage.exists("podcasts/audio").await);
        assert_eq!(storage.size("podcasts/audio/a.mp3").await.unwrap(), 1024);
        assert!(matches!(
            storage.size("missing.mp3").await,
            Err(StorageError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_open_range_yields_window_in_chunks() {
        let (_temp_dir, storage) = create_temp_storage(100);
        create_audio_fixture(storage.root(), "a.mp3", 1000);
        let expected = audio_bytes(1000);

        let (window, chunks) = collect(storage.open_range("a.mp3", 150, 499).await.unwrap()).await;
        assert_eq!(window, expected[150..=499].to_vec());
        assert_eq!(chunks, 4); // 350 bytes in 100 byte chunks

        let (single, _) = collect(storage.open_range("a.mp3", 999, 999).await.unwrap()).await;
        assert_eq!(single, vec![expected[999]]);
    }

    #[tokio::test]
    async fn test_open_range_rejects_bad_windows() {
        let (_temp_dir, storage) = create_temp_storage(8192);
        create_audio_fixture(storage.root(), "a.mp3", 100);

        assert!(matches!(
            storage.open_range("a.mp3", 50, 100).await,
            Err(StorageError::InvalidRange { size: 100, .. })
        ));
        assert!(matches!(
            storage.open_range("a.mp3", 60, 50).await,
            Err(StorageError::InvalidRange { .. })
        ));
        assert!(matches!(
            storage.open_range("b.mp3", 0, 1).await,
            Err(StorageError::NotFound { .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinks_must_stay_under_root() {
        let (_temp_dir, storage) = create_temp_storage(8192);
        let outside = tempfile::tempdir().unwrap();
        create_audio_fixture(outside.path(), "private.mp3", 64);
        create_audio_fixture(storage.root(), "podcasts/a.mp3", 32);

        std::os::unix::fs::symlink(
            outside.path().join("private.mp3"),
            storage.root().join("leak.mp3"),
        )
        .unwrap();
        std::os::unix::fs::symlink(
            storage.root().join("podcasts/a.mp3"),
            storage.root().join("alias.mp3"),
        )
        .unwrap();

        assert!(!storage.exists("leak.mp3").await);
        assert!(matches!(
            storage.size("leak.mp3").await,
            Err(StorageError::InvalidPath { .. })
        ));
        assert!(matches!(
            storage.open_range("leak.mp3", 0, 9).await,
            Err(StorageError::InvalidPath { .. })
        ));

        assert_eq!(storage.size("alias.mp3").await.unwrap(), 32);
        let (bytes, _) = collect(storage.open_range("alias.mp3", 0, 31).await.unwrap()).await;
        assert_eq!(bytes, audio_bytes(32));
    }

    #[tokio::test]
    async fn test_storage_info_counts_nested_files() {
        let (_temp_dir, storage) = create_temp_storage(8192);
        create_audio_fixture(storage.root(), "podcasts/audio/a.mp3", 1000);
        create_audio_fixture(storage.root(), "podcasts/audio/b.m4a", 500);
        create_audio_fixture(storage.root(), "images/covers/c.jpg", 24);

        let info = storage.storage_info().await.unwrap();
        assert_eq!(info.total_files, 3);
        assert_eq!(info.total_size_bytes, 1524);
    }

    #[tokio::test]
    async fn test_storage_info_missing_root() {
        let storage = LocalStorage::new("/nonexistent/fog/root", 8192);
        let info = storage.storage_info().await.unwrap();
        assert_eq!(info.total_files, 0);
    }
}
