//! In-memory persistence using a Tokio lock for single-node deployments
//! and tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use thumbhub_core::result::AppResult;
use thumbhub_core::types::{ImageId, PixelsId, RenderingSettingsId, ThumbnailId, UserId};
use thumbhub_entity::OwnerSelector;
use thumbhub_entity::pixels::Pixels;
use thumbhub_entity::rendering::{NewRenderingSettings, RenderingSettings};
use thumbhub_entity::thumbnail::{Dimensions, NewThumbnail, ThumbnailMetadata};

use crate::persistence::ThumbnailPersistence;

/// Rows held by the in-memory store.
#[derive(Debug, Default)]
struct Tables {
    pixels: HashMap<PixelsId, Pixels>,
    settings: HashMap<RenderingSettingsId, RenderingSettings>,
    thumbnails: HashMap<ThumbnailId, ThumbnailMetadata>,
}

impl Tables {
    /// Resolve the owner a row must have to match `selector` for a pixel set.
    fn expected_owner(&self, selector: OwnerSelector, pixels_id: PixelsId) -> Option<UserId> {
        match selector {
            OwnerSelector::User(id) => Some(id),
            OwnerSelector::PixelsOwner => self.pixels.get(&pixels_id).map(|p| p.owner_id),
        }
    }
}

/// In-memory [`ThumbnailPersistence`] with the same uniqueness rules as the
/// PostgreSQL schema.
#[derive(Debug, Clone, Default)]
pub struct MemoryThumbnailPersistence {
    tables: Arc<RwLock<Tables>>,
    metadata_queries: Arc<AtomicUsize>,
    metadata_inserts: Arc<AtomicUsize>,
}

impl MemoryThumbnailPersistence {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pixel set.
    pub async fn add_pixels(&self, pixels: Pixels) {
        self.tables.write().await.pixels.insert(pixels.id, pixels);
    }

    /// Store a rendering settings record as-is.
    pub async fn add_settings(&self, settings: RenderingSettings) {
        self.tables
            .write()
            .await
            .settings
            .insert(settings.id, settings);
    }

    /// Store a thumbnail metadata record as-is.
    pub async fn add_metadata(&self, metadata: ThumbnailMetadata) {
        self.tables
            .write()
            .await
            .thumbnails
            .insert(metadata.id, metadata);
    }

    /// Set the modification time of a rendering settings record.
    ///
    /// Returns `false` if the record does not exist.
    pub async fn touch_settings(&self, id: RenderingSettingsId, at: DateTime<Utc>) -> bool {
        match self.tables.write().await.settings.get_mut(&id) {
            Some(settings) => {
                settings.updated_at = at;
                true
            }
            None => false,
        }
    }

    /// Every stored thumbnail metadata row.
    pub async fn metadata_rows(&self) -> Vec<ThumbnailMetadata> {
        self.tables.read().await.thumbnails.values().cloned().collect()
    }

    /// Every stored rendering settings row.
    pub async fn settings_rows(&self) -> Vec<RenderingSettings> {
        self.tables.read().await.settings.values().cloned().collect()
    }

    /// Number of metadata reads served so far.
    pub fn metadata_queries(&self) -> usize {
        self.metadata_queries.load(Ordering::SeqCst)
    }

    /// Number of metadata insert batches served so far.
    pub fn metadata_inserts(&self) -> usize {
        self.metadata_inserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ThumbnailPersistence for MemoryThumbnailPersistence {
    async fn find_pixels(&self, ids: &[PixelsId]) -> AppResult<Vec<Pixels>> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.pixels.get(id).cloned())
            .collect())
    }

    async fn find_pixels_by_images(&self, image_ids: &[ImageId]) -> AppResult<Vec<Pixels>> {
        let tables = self.tables.read().await;
        Ok(tables
            .pixels
            .values()
            .filter(|p| image_ids.contains(&p.image_id))
            .cloned()
            .collect())
    }

    async fn find_settings(
        &self,
        owner: OwnerSelector,
        pixels_ids: &[PixelsId],
    ) -> AppResult<Vec<RenderingSettings>> {
        let tables = self.tables.read().await;
        Ok(tables
            .settings
            .values()
            .filter(|s| pixels_ids.contains(&s.pixels_id))
            .filter(|s| tables.expected_owner(owner, s.pixels_id) == Some(s.owner_id))
            .cloned()
            .collect())
    }

    async fn find_settings_by_id(
        &self,
        id: RenderingSettingsId,
    ) -> AppResult<Option<RenderingSettings>> {
        Ok(self.tables.read().await.settings.get(&id).cloned())
    }

    async fn insert_settings(&self, rows: &[NewRenderingSettings]) -> AppResult<Vec<PixelsId>> {
        let mut tables = self.tables.write().await;
        let mut created = Vec::new();
        for row in rows {
            let exists = tables
                .settings
                .values()
                .any(|s| s.pixels_id == row.pixels_id && s.owner_id == row.owner_id);
            if exists {
                continue;
            }
            let settings = RenderingSettings {
                id: RenderingSettingsId::new(),
                pixels_id: row.pixels_id,
                owner_id: row.owner_id,
                model: row.model,
                default_z: row.default_z,
                default_t: row.default_t,
                updated_at: Utc::now(),
            };
            tables.settings.insert(settings.id, settings);
            created.push(row.pixels_id);
        }
        Ok(created)
    }

    async fn find_metadata(
        &self,
        owner: OwnerSelector,
        dimensions: Dimensions,
        pixels_ids: &[PixelsId],
    ) -> AppResult<Vec<ThumbnailMetadata>> {
        self.metadata_queries.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables.read().await;
        Ok(tables
            .thumbnails
            .values()
            .filter(|t| t.dimensions() == dimensions && pixels_ids.contains(&t.pixels_id))
            .filter(|t| tables.expected_owner(owner, t.pixels_id) == Some(t.owner_id))
            .cloned()
            .collect())
    }

    async fn insert_metadata(&self, rows: &[NewThumbnail]) -> AppResult<Vec<ThumbnailId>> {
        self.metadata_inserts.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables.write().await;
        let mut created = Vec::new();
        for row in rows {
            let exists = tables.thumbnails.values().any(|t| {
                t.pixels_id == row.pixels_id
                    && t.owner_id == row.owner_id
                    && t.size_x == row.size_x
                    && t.size_y == row.size_y
            });
            if exists {
                debug!(pixels_id = %row.pixels_id, "Thumbnail metadata already exists, skipping");
                continue;
            }
            let metadata = ThumbnailMetadata {
                id: ThumbnailId::new(),
                pixels_id: row.pixels_id,
                owner_id: row.owner_id,
                size_x: row.size_x,
                size_y: row.size_y,
                mime_type: row.mime_type.clone(),
                updated_at: Utc::now(),
            };
            created.push(metadata.id);
            tables.thumbnails.insert(metadata.id, metadata);
        }
        Ok(created)
    }

    async fn touch_metadata(&self, id: ThumbnailId) -> AppResult<()> {
        if let Some(metadata) = self.tables.write().await.thumbnails.get_mut(&id) {
            metadata.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thumbhub_core::types::GroupId;
    use thumbhub_entity::rendering::RenderingModel;

    fn pixels(owner_id: UserId) -> Pixels {
        Pixels {
            id: PixelsId::new(),
            image_id: ImageId::new(),
            owner_id,
            group_id: GroupId::new(),
            size_x: 600,
            size_y: 400,
            size_z: 1,
            size_c: 1,
            size_t: 1,
        }
    }

    fn settings(pixels_id: PixelsId, owner_id: UserId) -> RenderingSettings {
        RenderingSettings {
            id: RenderingSettingsId::new(),
            pixels_id,
            owner_id,
            model: RenderingModel::Greyscale,
            default_z: 0,
            default_t: 0,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_owner_selector_filters_settings() {
        let store = MemoryThumbnailPersistence::new();
        let alice = UserId::new();
        let bob = UserId::new();
        let p = pixels(alice);
        store.add_pixels(p.clone()).await;
        store.add_settings(settings(p.id, alice)).await;
        store.add_settings(settings(p.id, bob)).await;

        let bobs = store
            .find_settings(OwnerSelector::User(bob), &[p.id])
            .await
            .unwrap();
        assert_eq!(bobs.len(), 1);
        assert_eq!(bobs[0].owner_id, bob);

        let owners = store
            .find_settings(OwnerSelector::PixelsOwner, &[p.id])
            .await
            .unwrap();
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].owner_id, alice);
    }

    #[tokio::test]
    async fn test_insert_metadata_skips_duplicates() {
        let store = MemoryThumbnailPersistence::new();
        let alice = UserId::new();
        let p = pixels(alice);
        store.add_pixels(p.clone()).await;

        let row = NewThumbnail {
            pixels_id: p.id,
            owner_id: alice,
            size_x: 96,
            size_y: 64,
            mime_type: "image/jpeg".to_string(),
        };
        let first = store.insert_metadata(&[row.clone()]).await.unwrap();
        let second = store.insert_metadata(&[row]).await.unwrap();

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        assert_eq!(store.metadata_rows().await.len(), 1);
        assert_eq!(store.metadata_inserts(), 2);
    }

    #[tokio::test]
    async fn test_find_metadata_matches_exact_dimensions() {
        let store = MemoryThumbnailPersistence::new();
        let alice = UserId::new();
        let p = pixels(alice);
        store.add_pixels(p.clone()).await;
        store
            .insert_metadata(&[NewThumbnail {
                pixels_id: p.id,
                owner_id: alice,
                size_x: 96,
                size_y: 64,
                mime_type: "image/jpeg".to_string(),
            }])
            .await
            .unwrap();

        let hit = store
            .find_metadata(OwnerSelector::User(alice), Dimensions::new(96, 64), &[p.id])
            .await
            .unwrap();
        let miss = store
            .find_metadata(OwnerSelector::User(alice), Dimensions::new(64, 96), &[p.id])
            .await
            .unwrap();

        assert_eq!(hit.len(), 1);
        assert!(miss.is_empty());
        assert_eq!(store.metadata_queries(), 2);
    }
}
