//! Persistence contract for thumbnail preparation.
//!
//! Every bulk read takes an [`OwnerSelector`] so the owner-scoped and the
//! pixel-set-owner variants of a query share a single code path.

use async_trait::async_trait;
use sqlx::PgPool;

use thumbhub_core::result::AppResult;
use thumbhub_core::types::{ImageId, PixelsId, RenderingSettingsId, ThumbnailId};
use thumbhub_entity::OwnerSelector;
use thumbhub_entity::pixels::Pixels;
use thumbhub_entity::rendering::{NewRenderingSettings, RenderingSettings};
use thumbhub_entity::thumbnail::{Dimensions, NewThumbnail, ThumbnailMetadata};

use crate::repositories::{PixelsRepository, RenderingSettingsRepository, ThumbnailRepository};

/// Bulk reads and inserts of pixel sets, rendering settings, and thumbnail
/// metadata.
///
/// Calls are expected to run inside the caller's transaction or request
/// boundary; implementations never lock on behalf of the caller.
#[async_trait]
pub trait ThumbnailPersistence: Send + Sync + 'static {
    /// Load pixel sets by ID. Unknown IDs are absent from the result.
    async fn find_pixels(&self, ids: &[PixelsId]) -> AppResult<Vec<Pixels>>;

    /// Load every pixel set belonging to the given images.
    async fn find_pixels_by_images(&self, image_ids: &[ImageId]) -> AppResult<Vec<Pixels>>;

    /// Load rendering settings for the given pixel sets.
    async fn find_settings(
        &self,
        owner: OwnerSelector,
        pixels_ids: &[PixelsId],
    ) -> AppResult<Vec<RenderingSettings>>;

    /// Load one rendering settings record.
    async fn find_settings_by_id(
        &self,
        id: RenderingSettingsId,
    ) -> AppResult<Option<RenderingSettings>>;

    /// Insert rendering settings; returns the pixel sets that gained a row.
    async fn insert_settings(&self, rows: &[NewRenderingSettings]) -> AppResult<Vec<PixelsId>>;

    /// Load thumbnail metadata of exactly `dimensions` for the given pixel sets.
    async fn find_metadata(
        &self,
        owner: OwnerSelector,
        dimensions: Dimensions,
        pixels_ids: &[PixelsId],
    ) -> AppResult<Vec<ThumbnailMetadata>>;

    /// Insert thumbnail metadata rows in one batch.
    ///
    /// Rows that already exist are skipped, so concurrent callers racing on
    /// the same key never fail; a subsequent read is authoritative.
    async fn insert_metadata(&self, rows: &[NewThumbnail]) -> AppResult<Vec<ThumbnailId>>;

    /// Mark thumbnail metadata as modified now, after its bytes were rewritten.
    async fn touch_metadata(&self, id: ThumbnailId) -> AppResult<()>;
}

/// PostgreSQL-backed persistence composed of the per-entity repositories.
#[derive(Debug, Clone)]
pub struct PgThumbnailPersistence {
    pixels: PixelsRepository,
    settings: RenderingSettingsRepository,
    thumbnails: ThumbnailRepository,
}

impl PgThumbnailPersistence {
    /// Create the persistence service over a pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pixels: PixelsRepository::new(pool.clone()),
            settings: RenderingSettingsRepository::new(pool.clone()),
            thumbnails: ThumbnailRepository::new(pool),
        }
    }
}

#[async_trait]
impl ThumbnailPersistence for PgThumbnailPersistence {
    async fn find_pixels(&self, ids: &[PixelsId]) -> AppResult<Vec<Pixels>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.pixels.find_by_ids(ids).await
    }

    async fn find_pixels_by_images(&self, image_ids: &[ImageId]) -> AppResult<Vec<Pixels>> {
        if image_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.pixels.find_by_image_ids(image_ids).await
    }

    async fn find_settings(
        &self,
        owner: OwnerSelector,
        pixels_ids: &[PixelsId],
    ) -> AppResult<Vec<RenderingSettings>> {
        if pixels_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.settings.find_for_pixels(owner, pixels_ids).await
    }

    async fn find_settings_by_id(
        &self,
        id: RenderingSettingsId,
    ) -> AppResult<Option<RenderingSettings>> {
        self.settings.find_by_id(id).await
    }

    async fn insert_settings(&self, rows: &[NewRenderingSettings]) -> AppResult<Vec<PixelsId>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        self.settings.insert_many(rows).await
    }

    async fn find_metadata(
        &self,
        owner: OwnerSelector,
        dimensions: Dimensions,
        pixels_ids: &[PixelsId],
    ) -> AppResult<Vec<ThumbnailMetadata>> {
        if pixels_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.thumbnails
            .find_for_pixels(owner, dimensions, pixels_ids)
            .await
    }

    async fn insert_metadata(&self, rows: &[NewThumbnail]) -> AppResult<Vec<ThumbnailId>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        self.thumbnails.insert_many(rows).await
    }

    async fn touch_metadata(&self, id: ThumbnailId) -> AppResult<()> {
        self.thumbnails.touch(id).await
    }
}
