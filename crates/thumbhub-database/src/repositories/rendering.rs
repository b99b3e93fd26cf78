//! Rendering settings repository implementation.

use sqlx::PgPool;

use thumbhub_core::error::{AppError, ErrorKind};
use thumbhub_core::result::AppResult;
use thumbhub_core::types::{PixelsId, RenderingSettingsId};
use thumbhub_entity::OwnerSelector;
use thumbhub_entity::rendering::{NewRenderingSettings, RenderingModel, RenderingSettings};

/// Repository for rendering settings reads and default creation.
#[derive(Debug, Clone)]
pub struct RenderingSettingsRepository {
    pool: PgPool,
}

impl RenderingSettingsRepository {
    /// Create a new rendering settings repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a settings record by ID.
    pub async fn find_by_id(&self, id: RenderingSettingsId) -> AppResult<Option<RenderingSettings>> {
        sqlx::query_as::<_, RenderingSettings>("SELECT * FROM rendering_settings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find rendering settings", e)
            })
    }

    /// Bulk-load settings for the given pixel sets.
    ///
    /// With [`OwnerSelector::PixelsOwner`] the bound owner is NULL and each
    /// row is matched against its pixel set's owner instead.
    pub async fn find_for_pixels(
        &self,
        owner: OwnerSelector,
        pixels_ids: &[PixelsId],
    ) -> AppResult<Vec<RenderingSettings>> {
        sqlx::query_as::<_, RenderingSettings>(
            "SELECT rs.* FROM rendering_settings rs \
             INNER JOIN pixels p ON p.id = rs.pixels_id \
             WHERE rs.pixels_id = ANY($1) \
             AND rs.owner_id = COALESCE($2::uuid, p.owner_id)",
        )
        .bind(pixels_ids.to_vec())
        .bind(owner.user())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load rendering settings", e)
        })
    }

    /// Insert settings rows, skipping pixel sets the owner already has
    /// settings for. Returns the pixel sets that gained a row.
    pub async fn insert_many(&self, rows: &[NewRenderingSettings]) -> AppResult<Vec<PixelsId>> {
        let pixels_ids: Vec<PixelsId> = rows.iter().map(|r| r.pixels_id).collect();
        let owner_ids: Vec<_> = rows.iter().map(|r| r.owner_id).collect();
        let models: Vec<RenderingModel> = rows.iter().map(|r| r.model).collect();
        let default_z: Vec<i32> = rows.iter().map(|r| r.default_z).collect();
        let default_t: Vec<i32> = rows.iter().map(|r| r.default_t).collect();

        sqlx::query_scalar::<_, PixelsId>(
            "INSERT INTO rendering_settings (pixels_id, owner_id, model, default_z, default_t) \
             SELECT * FROM UNNEST($1::uuid[], $2::uuid[], $3::rendering_model[], $4::int4[], $5::int4[]) \
             ON CONFLICT (pixels_id, owner_id) DO NOTHING \
             RETURNING pixels_id",
        )
        .bind(pixels_ids)
        .bind(owner_ids)
        .bind(models)
        .bind(default_z)
        .bind(default_t)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to create rendering settings", e)
        })
    }
}
