//! Pixel set repository implementation.

use sqlx::PgPool;

use thumbhub_core::error::{AppError, ErrorKind};
use thumbhub_core::result::AppResult;
use thumbhub_core::types::{ImageId, PixelsId};
use thumbhub_entity::pixels::Pixels;

/// Read-only access to pixel set descriptors.
#[derive(Debug, Clone)]
pub struct PixelsRepository {
    pool: PgPool,
}

impl PixelsRepository {
    /// Create a new pixels repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a pixel set by ID.
    pub async fn find_by_id(&self, id: PixelsId) -> AppResult<Option<Pixels>> {
        sqlx::query_as::<_, Pixels>("SELECT * FROM pixels WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find pixels", e))
    }

    /// Bulk-load pixel sets by ID.
    pub async fn find_by_ids(&self, ids: &[PixelsId]) -> AppResult<Vec<Pixels>> {
        sqlx::query_as::<_, Pixels>("SELECT * FROM pixels WHERE id = ANY($1)")
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load pixels", e))
    }

    /// Bulk-load every pixel set of the given images.
    pub async fn find_by_image_ids(&self, image_ids: &[ImageId]) -> AppResult<Vec<Pixels>> {
        sqlx::query_as::<_, Pixels>("SELECT * FROM pixels WHERE image_id = ANY($1)")
            .bind(image_ids.to_vec())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to load pixels by image", e)
            })
    }
}
