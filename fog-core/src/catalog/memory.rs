//! In-memory catalog backed by a JSON manifest.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info};

use super::{CatalogError, CatalogResult, MediaCatalog, MediaId, MediaResource};

/// Catalog holding every record in process memory.
///
/// Cloning shares the underlying records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    records: Arc<RwLock<BTreeMap<MediaId, MediaResource>>>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog pre-populated with the given records.
    pub fn from_resources(resources: impl IntoIterator<Item = MediaResource>) -> Self {
        let catalog = Self::new();
        for resource in resources {
            catalog.insert(resource);
        }
        catalog
    }

    /// Loads a catalog from a JSON array of records.
    ///
    /// # Errors
    ///
    /// - `CatalogError::Io` - Manifest could not be read
    /// - `CatalogError::InvalidManifest` - Manifest is not a JSON array of records
    pub async fn from_manifest(path: &Path) -> CatalogResult<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        let resources: Vec<MediaResource> =
            serde_json::from_str(&raw).map_err(|e| CatalogError::InvalidManifest {
                reason: format!("{}: {e}", path.display()),
            })?;

        info!(
            "Loaded {} media records from {}",
            resources.len(),
            path.display()
        );
        Ok(Self::from_resources(resources))
    }

    /// Inserts or replaces a record.
    pub fn insert(&self, resource: MediaResource) {
        self.records.write().insert(resource.id.clone(), resource);
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the catalog holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Current play count of a record, if present.
    pub fn play_count(&self, id: &MediaId) -> Option<u64> {
        self.records.read().get(id).map(|record| record.play_count)
    }
}

#[async_trait]
impl MediaCatalog for InMemoryCatalog {
    async fn resolve(&self, id: &MediaId) -> CatalogResult<Option<MediaResource>> {
        Ok(self.records.read().get(id).cloned())
    }

    async fn increment_play_count(&self, id: &MediaId) -> CatalogResult<u64> {
        let mut records = self.records.write();
        let record = records
            .get_mut(id)
            .ok_or_else(|| CatalogError::NotFound { id: id.clone() })?;

        record.play_count += 1;
        debug!("Play count for {} is now {}", id, record.play_count);
        Ok(record.play_count)
    }

    async fn list(&self) -> CatalogResult<Vec<MediaResource>> {
        Ok(self.records.read().values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn sample_catalog() -> InMemoryCatalog {
        InMemoryCatalog::from_resources([
            MediaResource::new(42u64, "Sunday Service", Some("podcast42.mp3".to_string())),
            MediaResource::new(43u64, "Unpublished", None),
        ])
    }

    #[tokio::test]
    async fn test_resolve_known_and_unknown() {
        let catalog = sample_catalog();

        let found = catalog.resolve(&MediaId::from(42u64)).await.unwrap();
        assert_eq!(found.unwrap().title, "Sunday Service");

        let missing = catalog.resolve(&MediaId::from(7u64)).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_increment_play_count() {
        let catalog = sample_catalog();
        let id = MediaId::from(42u64);

        assert_eq!(catalog.increment_play_count(&id).await.unwrap(), 1);
        assert_eq!(catalog.increment_play_count(&id).await.unwrap(), 2);
        assert_eq!(catalog.play_count(&id), Some(2));

        let result = catalog.increment_play_count(&MediaId::from(7u64)).await;
        assert!(matches!(result, Err(CatalogError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_clones_share_records() {
        let catalog = sample_catalog();
        let shared = catalog.clone();
        let id = MediaId::from(43u64);

        shared.increment_play_count(&id).await.unwrap();
        assert_eq!(catalog.play_count(&id), Some(1));
    }

    #[tokio::test]
    async fn test_from_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = temp_dir.path().join("catalog.json");
        tokio::fs::write(
            &manifest,
            r#"[
                {"id": "42", "title": "Sunday Service", "source_location": "/storage/podcasts/audio/podcast42.mp3", "play_count": 5},
                {"id": "43", "title": "Unpublished"}
            ]"#,
        )
        .await
        .unwrap();

        let catalog = InMemoryCatalog::from_manifest(&manifest).await.unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.play_count(&MediaId::from(42u64)), Some(5));

        let listed = catalog.list().await.unwrap();
        assert_eq!(listed[0].id, MediaId::from(42u64));
    }

    #[tokio::test]
    async fn test_invalid_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = temp_dir.path().join("catalog.json");
        tokio::fs::write(&manifest, "{not json").await.unwrap();

        let result = InMemoryCatalog::from_manifest(&manifest).await;
        assert!(matches!(result, Err(CatalogError::InvalidManifest { .. })));
    }
}
