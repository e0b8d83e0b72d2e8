//! Test fixtures for storage testing.
//!
//! Provides temporary storage roots and deterministic audio files so range
//! windows can be compared byte-for-byte against known content.

use std::path::{Path, PathBuf};

use super::LocalStorage;

/// Deterministic content of a fixture file of `len` bytes.
///
/// Uses a prime modulus so neighbouring windows never repeat at chunk
/// boundaries.
pub fn audio_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Writes a fixture file of `len` bytes at `relative` under `root`.
///
/// # Panics
///
/// Panics if the parent directories or file cannot be created.
/// This is acceptable in test fixtures where failures indicate environment issues.
pub fn create_audio_fixture(root: &Path, relative: &str, len: usize) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, audio_bytes(len)).unwrap();
    path
}

/// Creates a local storage backend over a fresh temporary directory.
///
/// The directory lives as long as the returned guard.
///
/// # Panics
///
/// Panics if the temporary directory cannot be created.
pub fn create_temp_storage(chunk_size: usize) -> (tempfile::TempDir, LocalStorage) {
    let temp_dir = tempfile::tempdir().unwrap();
    let storage = LocalStorage::new(temp_dir.path(), chunk_size);
    (temp_dir, storage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_fixture_content() {
        let (_temp_dir, storage) = create_temp_storage(8192);
        let path = create_audio_fixture(storage.root(), "nested/dir/a.mp3", 600);

        let written = std::fs::read(path).unwrap();
        assert_eq!(written.len(), 600);
        assert_eq!(written[251], 0);
        assert_eq!(written[252], 1);
    }
}
