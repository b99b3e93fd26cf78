//! Thumbnail metadata repository implementation.

use sqlx::PgPool;

use thumbhub_core::error::{AppError, ErrorKind};
use thumbhub_core::result::AppResult;
use thumbhub_core::types::{PixelsId, ThumbnailId};
use thumbhub_entity::OwnerSelector;
use thumbhub_entity::thumbnail::{Dimensions, NewThumbnail, ThumbnailMetadata};

/// Repository for thumbnail metadata rows.
#[derive(Debug, Clone)]
pub struct ThumbnailRepository {
    pool: PgPool,
}

impl ThumbnailRepository {
    /// Create a new thumbnail repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Bulk-load metadata of exactly `dimensions` for the given pixel sets.
    pub async fn find_for_pixels(
        &self,
        owner: OwnerSelector,
        dimensions: Dimensions,
        pixels_ids: &[PixelsId],
    ) -> AppResult<Vec<ThumbnailMetadata>> {
        sqlx::query_as::<_, ThumbnailMetadata>(
            "SELECT t.* FROM thumbnails t \
             INNER JOIN pixels p ON p.id = t.pixels_id \
             WHERE t.size_x = $1 AND t.size_y = $2 \
             AND t.pixels_id = ANY($3) \
             AND t.owner_id = COALESCE($4::uuid, p.owner_id)",
        )
        .bind(dimensions.width)
        .bind(dimensions.height)
        .bind(pixels_ids.to_vec())
        .bind(owner.user())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load thumbnail metadata", e)
        })
    }

    /// Insert metadata rows in one statement.
    ///
    /// Rows colliding with an existing `(pixels_id, owner_id, size_x, size_y)`
    /// are skipped; only identities of rows actually created are returned.
    pub async fn insert_many(&self, rows: &[NewThumbnail]) -> AppResult<Vec<ThumbnailId>> {
        let pixels_ids: Vec<PixelsId> = rows.iter().map(|r| r.pixels_id).collect();
        let owner_ids: Vec<_> = rows.iter().map(|r| r.owner_id).collect();
        let size_x: Vec<i32> = rows.iter().map(|r| r.size_x).collect();
        let size_y: Vec<i32> = rows.iter().map(|r| r.size_y).collect();
        let mime_types: Vec<String> = rows.iter().map(|r| r.mime_type.clone()).collect();

        sqlx::query_scalar::<_, ThumbnailId>(
            "INSERT INTO thumbnails (pixels_id, owner_id, size_x, size_y, mime_type) \
             SELECT * FROM UNNEST($1::uuid[], $2::uuid[], $3::int4[], $4::int4[], $5::text[]) \
             ON CONFLICT (pixels_id, owner_id, size_x, size_y) DO NOTHING \
             RETURNING id",
        )
        .bind(pixels_ids)
        .bind(owner_ids)
        .bind(size_x)
        .bind(size_y)
        .bind(mime_types)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to create thumbnail metadata", e)
        })
    }

    /// Bump a metadata row's modification time after its bytes were rewritten.
    pub async fn touch(&self, id: ThumbnailId) -> AppResult<()> {
        sqlx::query("UPDATE thumbnails SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to touch thumbnail metadata", e)
            })?;
        Ok(())
    }
}
